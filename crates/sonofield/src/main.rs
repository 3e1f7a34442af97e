//! sonofield - headless host for the audio-reactive pipeline
//!
//! Decodes a WAV file, runs it through a browser-style spectrum analyser at
//! a fixed frame rate and feeds every frame to the core pipeline.

mod cli;
mod host;
mod logging_setup;

use anyhow::{Context, Result};
use clap::Parser;
use sonofield_core::{Pipeline, SharedConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::host::{AnalyserConfig, SpectrumAnalyser, Track};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging_setup::init(&cli.log_config())?;

    info!("=== sonofield session started ===");

    let config = cli.pipeline_config()?;
    if let Err(e) = config.validate() {
        warn!("{}", e);
    }

    let track = Track::open(&cli.input)?;
    let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
    let mut pipeline = Pipeline::new(SharedConfig::new(config));

    let mut report_file = cli
        .report
        .as_ref()
        .map(|path| {
            File::create(path)
                .map(BufWriter::new)
                .with_context(|| format!("Failed to create report file {:?}", path))
        })
        .transpose()?;

    let report = host::run(
        &track,
        &mut pipeline,
        &mut analyser,
        &cli.run_options(),
        report_file.as_mut().map(|w| w as &mut dyn Write),
    )?;
    if let Some(mut writer) = report_file {
        writer.flush().context("Failed to flush report file")?;
    }

    report.print();
    info!("=== sonofield session finished ===");
    Ok(())
}
