//! Diagnostics - per-frame analysis summary
//!
//! Condenses one executed frame into band-group means and a count of strong
//! transients, for debug logging and run reports.

use serde::Serialize;
use tracing::debug;

use crate::bands::{BandEnergies, BandGroup, Transients};
use crate::pipeline::VisualFrame;

/// Transients above this count as strong
pub const STRONG_TRANSIENT: f32 = 0.5;

/// Band-group means of one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameSummary {
    /// Mean of bands 0-3
    pub lows: f32,
    /// Mean of bands 4-7
    pub mids: f32,
    /// Mean of bands 8-11
    pub highs: f32,
    /// Mean of bands 12-15
    pub ultra_highs: f32,
    /// Bands whose transient exceeds [`STRONG_TRANSIENT`]
    pub strong_transients: usize,
}

impl FrameSummary {
    /// Summarise raw band and transient arrays
    pub fn from_bands(bands: &BandEnergies, transients: &Transients) -> Self {
        let [lows, mids, highs, ultra_highs] = BandGroup::ALL.map(|group| group.mean(bands));
        Self {
            lows,
            mids,
            highs,
            ultra_highs,
            strong_transients: transients.iter().filter(|&&t| t > STRONG_TRANSIENT).count(),
        }
    }

    /// Summarise an executed frame
    pub fn from_frame(frame: &VisualFrame) -> Self {
        Self::from_bands(&frame.band_energies, &frame.transients)
    }

    /// Emit the summary at debug level
    pub fn log(&self) {
        debug!(
            "bands lows={:.1} mids={:.1} highs={:.1} ultra={:.1} transients>{}: {}",
            self.lows,
            self.mids,
            self.highs,
            self.ultra_highs,
            STRONG_TRANSIENT,
            self.strong_transients
        );
    }
}
