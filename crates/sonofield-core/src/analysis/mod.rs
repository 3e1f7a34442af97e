//! Audio analysis stages
//!
//! Frequency bytes in, band energies and transients out:
//! aggregation -> smoothing -> transient detection. The waveform level is an
//! optional side channel computed from time-domain samples.

pub mod aggregator;
pub mod smoothing;
pub mod transient;
pub mod waveform;

pub use aggregator::{
    aggregate_bands, band_bin_ranges, hz_range_to_bins, hz_to_mel, mel_band_edges, mel_to_hz,
    validate_sample_rate, FrequencyMapping,
};
pub use smoothing::{smooth_bands, DEFAULT_SMOOTHING};
pub use transient::{TransientDetector, TransientSettings};
pub use waveform::{rms, waveform_level, WaveformLevel};
