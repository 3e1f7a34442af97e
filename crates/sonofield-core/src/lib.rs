//! Sonofield Core - Audio Analysis and Visual Mapping
//!
//! This crate turns per-frame frequency data into visual state:
//! - 16-band aggregation with linear, logarithmic and mel mappings
//! - Temporal smoothing and transient detection
//! - ADSR envelope used as a global visual gain
//! - Mesh deformation, particle kinematics and motion trails
//! - Adaptive quality with frame skipping
//!
//! The host drives everything through [`Pipeline::tick`], once per displayed
//! frame. Nothing here touches audio devices or the GPU.

#![warn(missing_docs)]

pub use glam::Vec3;
use thiserror::Error;

pub mod analysis;
pub mod bands;
pub mod color;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod logging;
pub mod pipeline;
pub mod quality;
pub mod spatial;
pub mod visual;

// --- Re-exports grouped by category ---

// Analysis
pub use analysis::{
    aggregate_bands, hz_to_mel, mel_band_edges, mel_to_hz, smooth_bands, waveform_level,
    FrequencyMapping, TransientDetector, TransientSettings, WaveformLevel,
};
pub use bands::{
    BandEnergies, BandGroup, BandIntensities, FrequencyBand, Transients, BAND_COUNT,
    FREQUENCY_BANDS,
};
pub use envelope::{EnvelopeGenerator, EnvelopeSettings, EnvelopeState};

// Visual mapping
pub use color::{gradient_color, hsl_to_rgb};
pub use visual::{
    CentralObject, MaterialUpdate, ParticleField, ParticleLayout, SpectrumIntensity, TrailArena,
    TrailSettings,
};

// Performance
pub use quality::{QualityConfig, QualityController, QualityLevel, QualitySettings};
pub use spatial::{SpatialGrid, SpatialSettings};

// Configuration, logging & diagnostics
pub use config::{PipelineConfig, SharedConfig};
pub use diagnostics::FrameSummary;
pub use logging::LogConfig;

// Pipeline
pub use pipeline::{FrameInput, Pipeline, PipelineStats, VisualFrame};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// One or more configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sample rate is zero, negative or not finite
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
