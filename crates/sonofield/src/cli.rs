//! Command line and configuration loading

use anyhow::{Context, Result};
use clap::Parser;
use sonofield_core::{FrequencyMapping, LogConfig, PipelineConfig};
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "sonofield")]
#[command(about = "Audio-reactive visual pipeline driven from a WAV file")]
#[command(version)]
pub struct Cli {
    /// WAV file to play
    pub input: PathBuf,

    /// Display frame rate to simulate
    #[arg(long, default_value = "60")]
    pub fps: f32,

    /// Pipeline configuration (JSON); missing fields use defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frequency mapping: linear, logarithmic or mel
    #[arg(long)]
    pub mapping: Option<FrequencyMapping>,

    /// Temporal smoothing factor (0-1)
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Keep the initial quality level instead of adapting to the frame rate
    #[arg(long)]
    pub fixed_quality: bool,

    /// Pause playback at this many seconds
    #[arg(long)]
    pub pause_at: Option<f32>,

    /// Pause length in seconds
    #[arg(long, default_value = "1")]
    pub pause_for: f32,

    /// Stop after this many seconds of audio
    #[arg(long)]
    pub max_seconds: Option<f32>,

    /// Write one JSON line per executed frame to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log a band-group summary for every executed frame
    #[arg(long)]
    pub debug_analysis: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also log to a timestamped file
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            file_output: self.log_file,
            ..LogConfig::default()
        }
    }

    /// Load the configuration file, if any, then apply flag overrides
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => load_pipeline_config(path)?,
            None => PipelineConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(mapping) = self.mapping {
            config.mapping = mapping;
        }
        if let Some(smoothing) = self.smoothing {
            config.smoothing = smoothing;
        }
        if self.fixed_quality {
            config.quality.adaptive = false;
        }
        if self.debug_analysis {
            config.debug_analysis = true;
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            fps: self.fps,
            pause_at: self.pause_at,
            pause_for: self.pause_for,
            max_seconds: self.max_seconds,
        }
    }
}

/// Read a JSON pipeline configuration
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config file {:?}", path))
}
