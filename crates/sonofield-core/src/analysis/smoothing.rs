//! Temporal smoothing of band energies.

use crate::bands::{BandEnergies, BAND_COUNT};

/// Default smoothing factor
pub const DEFAULT_SMOOTHING: f32 = 0.7;

/// Exponential smoothing: `previous * k + current * (1 - k)`, per band.
///
/// `k = 0` passes the current frame through, `k = 1` freezes the previous
/// frame. Values outside [0, 1] are applied as given. The caller keeps the
/// result as the next frame's `previous`.
pub fn smooth_bands(current: &BandEnergies, previous: &BandEnergies, k: f32) -> BandEnergies {
    std::array::from_fn(|i| previous[i] * k + current[i] * (1.0 - k))
}
