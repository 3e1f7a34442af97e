//! Fixed-rate playback loop and run report
//!
//! Stands in for the display refresh callback: each frame advances the
//! playhead by `1 / fps` seconds, analyses the audio that ends at the
//! playhead and ticks the pipeline once.

use anyhow::{Context, Result};
use serde::Serialize;
use sonofield_core::{
    BandEnergies, EnvelopeState, FrameInput, FrameSummary, Pipeline, QualityLevel, Transients,
    VisualFrame, BAND_COUNT,
};
use std::io::Write;
use tracing::{debug, info};

use super::analyser::SpectrumAnalyser;
use super::wav::Track;

/// Playback schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Display frame rate
    pub fps: f32,
    /// Pause playback at this many seconds into the track
    pub pause_at: Option<f32>,
    /// Length of the pause in seconds
    pub pause_for: f32,
    /// Stop after this many seconds of track time
    pub max_seconds: Option<f32>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fps: 60.0,
            pause_at: None,
            pause_for: 1.0,
            max_seconds: None,
        }
    }
}

/// One JSON line per executed frame
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    /// Executed-frame index
    pub index: u64,
    /// Playhead in seconds
    pub time: f32,
    /// Quality level of the frame
    pub quality: QualityLevel,
    /// Envelope value
    pub envelope: f32,
    /// Band-group summary
    pub summary: FrameSummary,
    /// Smoothed band energies
    pub band_energies: &'a BandEnergies,
    /// Transients
    pub transients: &'a Transients,
    /// Active particles
    pub active_particles: usize,
    /// Waveform RMS, when available
    pub waveform_rms: Option<f32>,
}

impl<'a> FrameRecord<'a> {
    fn new(frame: &'a VisualFrame, time: f32) -> Self {
        Self {
            index: frame.index,
            time,
            quality: frame.quality,
            envelope: frame.envelope,
            summary: FrameSummary::from_frame(frame),
            band_energies: &frame.band_energies,
            transients: &frame.transients,
            active_particles: frame.active_particles,
            waveform_rms: frame.waveform.map(|w| w.rms),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Displayed frames
    pub frames: u64,
    /// Frames that ran the pipeline
    pub executed: u64,
    /// Frames skipped by the quality divisor
    pub skipped: u64,
    /// Frames without usable input
    pub missing_input: u64,
    /// Frames spent paused
    pub paused: u64,
    /// Quality level at the end of the run
    pub final_quality: QualityLevel,
    /// Highest smoothed energy seen per band
    pub peak_band_energies: BandEnergies,
    /// Envelope value at the end of the run
    pub final_envelope: f32,
    /// Envelope phase at the end of the run
    pub final_envelope_state: EnvelopeState,
    /// Track time covered
    pub seconds: f32,
}

impl RunReport {
    /// Print a human-readable summary to stdout
    pub fn print(&self) {
        println!("frames      {}", self.frames);
        println!("  executed  {}", self.executed);
        println!("  skipped   {}", self.skipped);
        println!("  no input  {}", self.missing_input);
        println!("  paused    {}", self.paused);
        println!("quality     {}", self.final_quality);
        println!(
            "envelope    {:.3} ({:?})",
            self.final_envelope, self.final_envelope_state
        );
        println!("track time  {:.2} s", self.seconds);
        println!("peak band energies:");
        for (band, peak) in sonofield_core::FREQUENCY_BANDS
            .iter()
            .zip(&self.peak_band_energies)
        {
            println!("  {:<12} {:6.1}", band.name, peak);
        }
    }
}

/// Drive `pipeline` through the whole track
pub fn run(
    track: &Track,
    pipeline: &mut Pipeline,
    analyser: &mut SpectrumAnalyser,
    options: &RunOptions,
    mut frame_log: Option<&mut dyn Write>,
) -> Result<RunReport> {
    let fps = if options.fps.is_finite() && options.fps > 0.0 {
        options.fps
    } else {
        60.0
    };
    let dt = 1.0 / fps;
    let sample_rate = track.sample_rate as f32;
    let end_seconds = options
        .max_seconds
        .map_or(track.duration_seconds(), |max| max.min(track.duration_seconds()));

    let mut window = Vec::with_capacity(analyser.fft_size());
    let mut peaks = [0.0f32; BAND_COUNT];
    let mut playhead = 0.0f32;
    let mut frames = 0u64;
    let mut pause_left: Option<f32> = None;
    let mut pause_done = false;

    info!(
        "Running {:.1} s of audio at {} fps ({} bins)",
        end_seconds,
        fps,
        analyser.bin_count()
    );
    pipeline.on_play();

    while playhead < end_seconds {
        frames += 1;

        if let Some(left) = pause_left.as_mut() {
            *left -= dt;
            pipeline.tick(dt, None);
            if *left <= 0.0 {
                pause_left = None;
                pipeline.on_play();
            }
            continue;
        }
        if !pause_done && options.pause_at.is_some_and(|at| playhead >= at) {
            debug!("Pausing at {:.2} s for {:.2} s", playhead, options.pause_for);
            pipeline.on_pause();
            pause_left = Some(options.pause_for.max(0.0));
            pause_done = true;
            continue;
        }

        playhead += dt;
        let end_sample = (playhead * sample_rate) as usize;
        track.window_ending_at(end_sample, analyser.fft_size(), &mut window);
        let magnitudes = analyser.analyse(&window);

        let input = FrameInput {
            magnitudes,
            time_domain: &window,
            sample_rate,
        };
        let Some(frame) = pipeline.tick(dt, Some(input)) else {
            continue;
        };

        for (peak, energy) in peaks.iter_mut().zip(&frame.band_energies) {
            *peak = peak.max(*energy);
        }
        if let Some(out) = frame_log.as_mut() {
            serde_json::to_writer(&mut **out, &FrameRecord::new(frame, playhead))
                .context("Failed to write frame record")?;
            writeln!(out).context("Failed to write frame record")?;
        }
    }

    pipeline.on_pause();
    if let Some(out) = frame_log.as_mut() {
        out.flush().context("Failed to flush frame records")?;
    }

    let stats = pipeline.stats();
    Ok(RunReport {
        frames,
        executed: stats.executed,
        skipped: stats.skipped,
        missing_input: stats.missing_input,
        paused: stats.paused,
        final_quality: pipeline.quality().level(),
        peak_band_energies: peaks,
        final_envelope: pipeline.envelope().value(),
        final_envelope_state: pipeline.envelope().state(),
        seconds: playhead,
    })
}
