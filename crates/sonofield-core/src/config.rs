//! Pipeline configuration
//!
//! [`PipelineConfig`] holds every tunable the control surface can touch.
//! [`SharedConfig`] publishes whole snapshots through an `ArcSwap` so the
//! pipeline can read one consistent copy per frame while writers replace it
//! at any time.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::{FrequencyMapping, TransientSettings, DEFAULT_SMOOTHING};
use crate::bands::{default_intensities, BandIntensities, FREQUENCY_BANDS, INTENSITY_RANGE};
use crate::envelope::EnvelopeSettings;
use crate::quality::QualityConfig;
use crate::spatial::SpatialSettings;
use crate::visual::{CentralMappingSettings, ParticleLayout, ParticleMappingSettings, TrailSettings};
use crate::{CoreError, Result};

/// Every tunable of the analysis and mapping pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Hz-to-band assignment
    pub mapping: FrequencyMapping,
    /// Temporal smoothing factor k (0 = no smoothing, 1 = frozen)
    pub smoothing: f32,
    /// Transient detector tunables
    pub transient: TransientSettings,
    /// Per-band gain (0.0 - 2.0)
    pub band_intensities: BandIntensities,
    /// ADSR tunables
    pub envelope: EnvelopeSettings,
    /// Scale the bands handed to the visual mapper by the envelope value
    pub envelope_gain: bool,
    /// Motion trails
    pub trails: TrailSettings,
    /// Adaptive quality
    pub quality: QualityConfig,
    /// Particle shell (read at pipeline construction)
    pub particles: ParticleLayout,
    /// Particle mapping gains
    pub particle_mapping: ParticleMappingSettings,
    /// Central object mapping gains
    pub central_mapping: CentralMappingSettings,
    /// Spatial grid
    pub spatial: SpatialSettings,
    /// Log a per-frame band-group summary at debug level
    pub debug_analysis: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mapping: FrequencyMapping::default(),
            smoothing: DEFAULT_SMOOTHING,
            transient: TransientSettings::default(),
            band_intensities: default_intensities(),
            envelope: EnvelopeSettings::default(),
            envelope_gain: true,
            trails: TrailSettings::default(),
            quality: QualityConfig::default(),
            particles: ParticleLayout::default(),
            particle_mapping: ParticleMappingSettings::default(),
            central_mapping: CentralMappingSettings::default(),
            spatial: SpatialSettings::default(),
            debug_analysis: false,
        }
    }
}

fn in_unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

fn positive(value: f32) -> bool {
    value > 0.0
}

impl PipelineConfig {
    /// Restore the quick-reset subset: smoothing, sensitivity, trail length
    /// and opacity, and the mapping mode.
    pub fn reset_to_defaults(&mut self) {
        let defaults = Self::default();
        self.smoothing = defaults.smoothing;
        self.transient.sensitivity = defaults.transient.sensitivity;
        self.trails.length = defaults.trails.length;
        self.trails.opacity = defaults.trails.opacity;
        self.mapping = defaults.mapping;
    }

    /// Human-readable description of every out-of-range field
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !in_unit(self.smoothing) {
            issues.push(format!("smoothing {} outside [0, 1]", self.smoothing));
        }
        if !(self.transient.sensitivity.is_finite() && self.transient.sensitivity >= 0.0) {
            issues.push(format!(
                "transient sensitivity {} is negative",
                self.transient.sensitivity
            ));
        }
        if !positive(self.transient.threshold) {
            issues.push(format!(
                "transient threshold {} must be positive",
                self.transient.threshold
            ));
        }
        if !in_unit(self.transient.decay_rate) {
            issues.push(format!(
                "transient decay rate {} outside [0, 1]",
                self.transient.decay_rate
            ));
        }

        let (lo, hi) = INTENSITY_RANGE;
        for (band, value) in FREQUENCY_BANDS.iter().zip(&self.band_intensities) {
            if !(lo..=hi).contains(value) {
                issues.push(format!(
                    "{} intensity {} outside [{}, {}]",
                    band.name, value, lo, hi
                ));
            }
        }

        for (name, time) in [
            ("attack", self.envelope.attack),
            ("decay", self.envelope.decay),
            ("release", self.envelope.release),
        ] {
            if !positive(time) {
                issues.push(format!("envelope {} time {} must be positive", name, time));
            }
        }
        if !in_unit(self.envelope.sustain) {
            issues.push(format!(
                "envelope sustain {} outside [0, 1]",
                self.envelope.sustain
            ));
        }

        if self.trails.length == 0 {
            issues.push("trail length must be at least 1".to_string());
        }
        if !in_unit(self.trails.opacity) {
            issues.push(format!("trail opacity {} outside [0, 1]", self.trails.opacity));
        }
        if !in_unit(self.trails.decay) {
            issues.push(format!("trail decay {} outside [0, 1]", self.trails.decay));
        }

        if !positive(self.quality.target_fps) {
            issues.push(format!(
                "target fps {} must be positive",
                self.quality.target_fps
            ));
        }
        if !positive(self.spatial.cell_size) {
            issues.push(format!(
                "spatial cell size {} must be positive",
                self.spatial.cell_size
            ));
        }

        issues
    }

    /// Check every field against its documented range
    pub fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidConfig(issues.join("; ")))
        }
    }
}

/// Tear-free shared handle to the live configuration
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<ArcSwap<PipelineConfig>>,
}

impl SharedConfig {
    /// Wrap an initial configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current snapshot; stays valid and unchanged while held
    pub fn snapshot(&self) -> Arc<PipelineConfig> {
        self.inner.load_full()
    }

    /// Replace the whole configuration
    pub fn store(&self, config: PipelineConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Read-copy-update a change onto the current configuration.
    ///
    /// `f` may run more than once if another writer races this one.
    pub fn update<F>(&self, mut f: F)
    where
        F: FnMut(&mut PipelineConfig),
    {
        self.inner.rcu(|current| {
            let mut next = PipelineConfig::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
