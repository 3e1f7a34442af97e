//! Band aggregation - frequency bins to 16 band energies
//!
//! Converts a fixed-size magnitude spectrum (0-255 bytes as delivered by the
//! host analyser) into [`BAND_COUNT`] aggregate energies using one of three
//! mappings. Each band is the mean of its bin range; a range that covers no
//! bins yields 0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::bands::{
    BandEnergies, BandIntensities, BAND_COUNT, FREQUENCY_BANDS, MAX_BAND_HZ, MIN_BAND_HZ,
};
use crate::{CoreError, Result};

/// How frequency bins are grouped into bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyMapping {
    /// 16 equal-width blocks over the whole bin array
    Linear,
    /// The 16 named bands with fixed, progressively widening Hz ranges
    #[default]
    Logarithmic,
    /// 16 equal-width bands in Mel space between 20 Hz and 24 kHz
    Mel,
}

impl FrequencyMapping {
    /// All mappings
    pub const ALL: [FrequencyMapping; 3] = [
        FrequencyMapping::Linear,
        FrequencyMapping::Logarithmic,
        FrequencyMapping::Mel,
    ];

    /// Lowercase identifier used by configs and the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyMapping::Linear => "linear",
            FrequencyMapping::Logarithmic => "logarithmic",
            FrequencyMapping::Mel => "mel",
        }
    }
}

impl fmt::Display for FrequencyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyMapping {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(FrequencyMapping::Linear),
            "logarithmic" | "log" => Ok(FrequencyMapping::Logarithmic),
            "mel" => Ok(FrequencyMapping::Mel),
            other => Err(format!(
                "unknown frequency mapping '{}', expected linear, logarithmic or mel",
                other
            )),
        }
    }
}

/// Convert a frequency in Hz to the Mel scale
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert a Mel value back to Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// The 17 band edges (Hz) of the Mel mapping, lowest first
pub fn mel_band_edges() -> [f32; BAND_COUNT + 1] {
    let min_mel = hz_to_mel(MIN_BAND_HZ);
    let max_mel = hz_to_mel(MAX_BAND_HZ);
    let step = (max_mel - min_mel) / BAND_COUNT as f32;

    let mut edges = [0.0; BAND_COUNT + 1];
    for (i, edge) in edges.iter_mut().enumerate() {
        *edge = mel_to_hz(min_mel + i as f32 * step);
    }
    // Pin the outer edges so float drift cannot shift the covered range
    edges[0] = MIN_BAND_HZ;
    edges[BAND_COUNT] = MAX_BAND_HZ;
    edges
}

/// Bin range `[floor(min / nyquist * len), floor(max / nyquist * len))`,
/// clamped to the array.
pub fn hz_range_to_bins(min_hz: f32, max_hz: f32, nyquist: f32, len: usize) -> Range<usize> {
    let to_bin = |hz: f32| -> usize {
        let bin = (hz / nyquist * len as f32).floor();
        if bin.is_finite() && bin > 0.0 {
            (bin as usize).min(len)
        } else {
            0
        }
    };

    let start = to_bin(min_hz);
    let end = to_bin(max_hz).max(start);
    start..end
}

/// Bin ranges for every band under `mapping`
pub fn band_bin_ranges(
    mapping: FrequencyMapping,
    sample_rate: f32,
    len: usize,
) -> [Range<usize>; BAND_COUNT] {
    let nyquist = sample_rate / 2.0;

    match mapping {
        FrequencyMapping::Logarithmic => std::array::from_fn(|i| {
            let band = &FREQUENCY_BANDS[i];
            hz_range_to_bins(band.min_hz, band.max_hz, nyquist, len)
        }),
        FrequencyMapping::Mel => {
            let edges = mel_band_edges();
            std::array::from_fn(|i| hz_range_to_bins(edges[i], edges[i + 1], nyquist, len))
        }
        FrequencyMapping::Linear => {
            let block = len / BAND_COUNT;
            std::array::from_fn(|i| {
                let start = i * block;
                // Remainder bins go to the last band
                let end = if i == BAND_COUNT - 1 { len } else { start + block };
                start..end.max(start)
            })
        }
    }
}

/// Accept only positive finite sample rates
pub fn validate_sample_rate(sample_rate: f32) -> Result<f32> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(CoreError::InvalidSampleRate(sample_rate))
    }
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / bins.len() as f32
}

/// Aggregate a byte spectrum into band energies.
///
/// Pure function of its inputs. Returns all zeros when the spectrum is empty
/// or the sample rate is not a positive finite number. Each band is scaled by
/// its intensity multiplier after averaging.
pub fn aggregate_bands(
    magnitudes: &[u8],
    sample_rate: f32,
    mapping: FrequencyMapping,
    intensities: &BandIntensities,
) -> BandEnergies {
    let mut bands = [0.0; BAND_COUNT];

    if magnitudes.is_empty() || validate_sample_rate(sample_rate).is_err() {
        return bands;
    }

    let ranges = band_bin_ranges(mapping, sample_rate, magnitudes.len());
    for (i, range) in ranges.into_iter().enumerate() {
        let energy = mean(&magnitudes[range]) * intensities[i];
        bands[i] = if energy.is_finite() { energy } else { 0.0 };
    }

    bands
}
