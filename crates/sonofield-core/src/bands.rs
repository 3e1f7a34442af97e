//! Frequency band layout
//!
//! The 16 named bands the whole pipeline is sized around, from SubBass up to
//! Air2, with their Hz ranges and display colours.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of aggregate frequency bands
pub const BAND_COUNT: usize = 16;

/// Per-band aggregate energies (0..255 scale for byte spectra)
pub type BandEnergies = [f32; BAND_COUNT];

/// Per-band transient strengths in [0, 1]
pub type Transients = [f32; BAND_COUNT];

/// Per-band intensity multipliers set by the control surface
pub type BandIntensities = [f32; BAND_COUNT];

/// Lowest frequency covered by the band layout (Hz)
pub const MIN_BAND_HZ: f32 = 20.0;

/// Highest frequency covered by the band layout (Hz)
pub const MAX_BAND_HZ: f32 = 24_000.0;

/// Range of valid user intensity multipliers
pub const INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);

/// A named aggregate frequency range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrequencyBand {
    /// Display name
    pub name: &'static str,
    /// Lower edge in Hz
    pub min_hz: f32,
    /// Upper edge in Hz
    pub max_hz: f32,
    /// Display colour as 0xRRGGBB
    pub color_hex: u32,
}

impl FrequencyBand {
    const fn new(name: &'static str, min_hz: f32, max_hz: f32, color_hex: u32) -> Self {
        Self {
            name,
            min_hz,
            max_hz,
            color_hex,
        }
    }

    /// Display colour as normalized RGB
    pub fn color(&self) -> Vec3 {
        crate::color::rgb_from_hex(self.color_hex)
    }

    /// Width of the band in Hz
    pub fn width_hz(&self) -> f32 {
        self.max_hz - self.min_hz
    }
}

/// Canonical band table, ordered from lowest to highest frequency
pub const FREQUENCY_BANDS: [FrequencyBand; BAND_COUNT] = [
    // Lows
    FrequencyBand::new("SubBass", 20.0, 60.0, 0xff0000),
    FrequencyBand::new("Bass", 60.0, 120.0, 0xff4400),
    FrequencyBand::new("LowBass", 120.0, 200.0, 0xff8800),
    FrequencyBand::new("HighBass", 200.0, 320.0, 0xffaa00),
    // Mids
    FrequencyBand::new("LowMid", 320.0, 500.0, 0xffdd00),
    FrequencyBand::new("Mid", 500.0, 800.0, 0xddff00),
    FrequencyBand::new("HighMid", 800.0, 1200.0, 0x88ff00),
    FrequencyBand::new("UpperMid", 1200.0, 2000.0, 0x44ff00),
    // Highs
    FrequencyBand::new("LowTreble", 2000.0, 3200.0, 0x00ff44),
    FrequencyBand::new("Treble", 3200.0, 5000.0, 0x00ff88),
    FrequencyBand::new("HighTreble", 5000.0, 8000.0, 0x00ffdd),
    FrequencyBand::new("SuperTreble", 8000.0, 12000.0, 0x00ddff),
    // Ultra highs
    FrequencyBand::new("Brilliance1", 12000.0, 16000.0, 0x0088ff),
    FrequencyBand::new("Brilliance2", 16000.0, 20000.0, 0x0044ff),
    FrequencyBand::new("Air1", 20000.0, 22000.0, 0x4400ff),
    FrequencyBand::new("Air2", 22000.0, 24000.0, 0x8800ff),
];

/// Band colours as normalized RGB, in band order
pub fn band_colors() -> [Vec3; BAND_COUNT] {
    FREQUENCY_BANDS.map(|band| band.color())
}

/// Default intensity multipliers (all 1.0)
pub fn default_intensities() -> BandIntensities {
    [1.0; BAND_COUNT]
}

/// Band name lookup, case-insensitive
pub fn band_index(name: &str) -> Option<usize> {
    FREQUENCY_BANDS
        .iter()
        .position(|band| band.name.eq_ignore_ascii_case(name))
}

/// Which part of the spectrum a band belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandGroup {
    /// Bands 0..4
    Lows,
    /// Bands 4..8
    Mids,
    /// Bands 8..12
    Highs,
    /// Bands 12..16
    UltraHighs,
}

impl BandGroup {
    /// All groups in spectral order
    pub const ALL: [BandGroup; 4] = [
        BandGroup::Lows,
        BandGroup::Mids,
        BandGroup::Highs,
        BandGroup::UltraHighs,
    ];

    /// Band indices covered by this group
    pub fn range(self) -> std::ops::Range<usize> {
        let start = self as usize * 4;
        start..start + 4
    }

    /// Mean energy of the group's bands
    pub fn mean(self, bands: &BandEnergies) -> f32 {
        bands[self.range()].iter().sum::<f32>() / 4.0
    }
}
