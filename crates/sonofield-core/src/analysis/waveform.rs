//! Time-domain level of the current audio window.

use glam::Vec3;
use serde::Serialize;

use crate::color::gradient_color;

/// Gain applied to the RMS before clamping to [0, 1]
const RMS_GAIN: f32 = 4.0;

/// Loudness of one time-domain window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveformLevel {
    /// Root mean square of the samples (-1..1 input)
    pub rms: f32,
    /// `min(rms * 4, 1)`
    pub intensity: f32,
    /// Gradient colour for `intensity`
    pub color: Vec3,
}

/// RMS of a sample window; non-finite samples count as silence
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    (sum / samples.len() as f32).sqrt()
}

/// Level of a time-domain window, or `None` when no samples were supplied
pub fn waveform_level(samples: &[f32]) -> Option<WaveformLevel> {
    if samples.is_empty() {
        return None;
    }
    let rms = rms(samples);
    let intensity = (rms * RMS_GAIN).min(1.0);
    Some(WaveformLevel {
        rms,
        intensity,
        color: gradient_color(intensity),
    })
}
