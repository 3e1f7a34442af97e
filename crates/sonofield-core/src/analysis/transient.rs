//! Transient detection with soft clipping and exponential decay
//!
//! A rise in a band's smoothed energy produces an attack strength of
//! `tanh(diff / threshold * sensitivity)`. Without a rise the band's last
//! value decays by `decay_rate` each frame. The peak history is rewritten
//! every frame, attack or not, which is what drives the decay toward 0.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bands::{BandEnergies, Transients, BAND_COUNT};

/// Tunables for [`TransientDetector`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransientSettings {
    /// Detection on/off; when off every output is 0
    pub enabled: bool,
    /// Energy rise that maps to a normalized difference of 1.0
    pub threshold: f32,
    /// Multiplier on the normalized difference before soft clipping
    pub sensitivity: f32,
    /// Per-frame decay factor applied when no attack is detected
    pub decay_rate: f32,
}

impl Default for TransientSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.1,
            sensitivity: 1.0,
            decay_rate: 0.85,
        }
    }
}

/// Per-band attack detector with a peak-history buffer
#[derive(Debug, Clone, Default)]
pub struct TransientDetector {
    peak_history: Transients,
}

impl TransientDetector {
    /// Create a detector with an empty peak history
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute this frame's transients from the current and previous
    /// smoothed bands.
    pub fn detect(
        &mut self,
        current: &BandEnergies,
        previous: &BandEnergies,
        settings: &TransientSettings,
    ) -> Transients {
        if !settings.enabled {
            self.peak_history = [0.0; BAND_COUNT];
            return self.peak_history;
        }

        let mut transients = [0.0; BAND_COUNT];
        for i in 0..BAND_COUNT {
            let diff = current[i] - previous[i];

            let value = if diff > 0.0 {
                (diff / settings.threshold * settings.sensitivity).tanh()
            } else {
                self.peak_history[i] * settings.decay_rate
            };

            // NaN from a zero threshold or a poisoned history collapses to 0
            transients[i] = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
        }

        self.peak_history = transients;
        trace!("transients: {:?}", transients);
        transients
    }

    /// Last computed transients
    pub fn peaks(&self) -> &Transients {
        &self.peak_history
    }

    /// Clear the peak history
    pub fn reset(&mut self) {
        self.peak_history = [0.0; BAND_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_no_transient() {
        let mut detector = TransientDetector::new();
        let bands = [100.0; BAND_COUNT];
        let out = detector.detect(&bands, &bands, &TransientSettings::default());
        assert_eq!(out, [0.0; BAND_COUNT]);
    }

    #[test]
    fn test_attack_is_soft_clipped() {
        let mut detector = TransientDetector::new();
        let previous = [0.0; BAND_COUNT];
        let mut current = [0.0; BAND_COUNT];
        current[2] = 0.05;
        current[5] = 500.0;

        let out = detector.detect(&current, &previous, &TransientSettings::default());
        assert!((out[2] - 0.5f32.tanh()).abs() < 1e-6);
        assert!(out[5] <= 1.0 && out[5] > 0.99);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_decay_after_attack() {
        let settings = TransientSettings::default();
        let mut detector = TransientDetector::new();
        let previous = [0.0; BAND_COUNT];
        let mut current = [0.0; BAND_COUNT];
        current[0] = 0.05;

        let first = detector.detect(&current, &previous, &settings)[0];
        let second = detector.detect(&current, &current, &settings)[0];
        assert!((second - first * settings.decay_rate).abs() < 1e-6);
    }

    #[test]
    fn test_falling_energy_decays_not_negative() {
        let mut detector = TransientDetector::new();
        let previous = [100.0; BAND_COUNT];
        let current = [0.0; BAND_COUNT];
        let out = detector.detect(&current, &previous, &TransientSettings::default());
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_decay_rate_above_one_is_clamped() {
        let settings = TransientSettings {
            decay_rate: 3.0,
            ..Default::default()
        };
        let mut detector = TransientDetector::new();
        let mut current = [0.0; BAND_COUNT];
        current[0] = 10.0;
        detector.detect(&current, &[0.0; BAND_COUNT], &settings);
        for _ in 0..5 {
            let out = detector.detect(&current, &current, &settings);
            assert!(out[0] <= 1.0);
        }
    }

    #[test]
    fn test_zero_threshold_is_finite() {
        let settings = TransientSettings {
            threshold: 0.0,
            ..Default::default()
        };
        let mut detector = TransientDetector::new();
        let mut current = [0.0; BAND_COUNT];
        current[1] = 1.0;
        let out = detector.detect(&current, &[0.0; BAND_COUNT], &settings);
        assert_eq!(out[1], 1.0);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_disabled_outputs_zero_and_clears_history() {
        let mut detector = TransientDetector::new();
        let mut current = [0.0; BAND_COUNT];
        current[0] = 1.0;
        detector.detect(&current, &[0.0; BAND_COUNT], &TransientSettings::default());
        assert!(detector.peaks()[0] > 0.0);

        let disabled = TransientSettings {
            enabled: false,
            ..Default::default()
        };
        let out = detector.detect(&current, &[0.0; BAND_COUNT], &disabled);
        assert_eq!(out, [0.0; BAND_COUNT]);
        assert_eq!(detector.peaks()[0], 0.0);
    }
}
