//! Spectrum analyser producing byte magnitudes
//!
//! Behaves like a browser analyser node: Blackman-windowed FFT, per-bin
//! magnitude smoothing over time, then a linear mapping of the decibel range
//! onto 0-255.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::debug;

/// Analyser tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// FFT size (bins = fft_size / 2)
    pub fft_size: usize,
    /// Magnitude smoothing time constant (0.0 - 1.0)
    pub smoothing: f32,
    /// Level mapped to byte 0
    pub min_decibels: f32,
    /// Level mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Blackman window of length `n`
pub fn blackman_window(n: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// Map a magnitude onto 0-255 through the decibel window
pub fn magnitude_to_byte(magnitude: f32, min_db: f32, max_db: f32) -> u8 {
    let range = max_db - min_db;
    if !(range.is_finite() && range > 0.0) || !(magnitude.is_finite() && magnitude > 0.0) {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 / range * (db - min_db);
    if scaled.is_finite() {
        scaled.clamp(0.0, 255.0) as u8
    } else {
        0
    }
}

/// FFT analyser with per-bin smoothing state
pub struct SpectrumAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl SpectrumAnalyser {
    /// Plan the FFT. Sizes below 32 are raised to 32.
    pub fn new(config: AnalyserConfig) -> Self {
        let fft_size = config.fft_size.max(32);
        let config = AnalyserConfig { fft_size, ..config };

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        debug!(
            "Analyser: fft_size={}, smoothing={}, range={}..{} dB",
            fft_size, config.smoothing, config.min_decibels, config.max_decibels
        );

        Self {
            config,
            fft,
            window: blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; fft_size / 2],
            bytes: vec![0; fft_size / 2],
        }
    }

    /// Samples consumed per analysis
    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Number of frequency bins produced
    pub fn bin_count(&self) -> usize {
        self.bytes.len()
    }

    /// Analyse the most recent `fft_size` samples. Shorter input is
    /// zero-padded at the front.
    pub fn analyse(&mut self, samples: &[f32]) -> &[u8] {
        let n = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let k = self.config.smoothing.clamp(0.0, 1.0);
        let scale = 1.0 / n as f32;
        for ((smoothed, byte), bin) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .zip(&self.buffer)
        {
            let magnitude = bin.norm() * scale;
            *smoothed = k * *smoothed + (1.0 - k) * magnitude;
            *byte = magnitude_to_byte(
                *smoothed,
                self.config.min_decibels,
                self.config.max_decibels,
            );
        }

        &self.bytes
    }

    /// Forget the smoothing history
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
        self.bytes.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Quiet enough that only the centre bin ends up loudest
    const AMPLITUDE: f32 = 0.001;

    fn sine(freq: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| AMPLITUDE * (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window_shape() {
        let w = blackman_window(1024);
        assert!(w[0].abs() < 1e-6);
        assert!((w[512] - 1.0).abs() < 1e-4);
        assert!(w.iter().all(|&v| v >= -1e-6 && v <= 1.0 + 1e-6));
    }

    #[test]
    fn test_magnitude_to_byte_range() {
        assert_eq!(magnitude_to_byte(0.0, -100.0, -30.0), 0);
        // -100 dB
        assert_eq!(magnitude_to_byte(1e-5, -100.0, -30.0), 0);
        // -40 dB
        assert_eq!(magnitude_to_byte(0.01, -100.0, -30.0), 218);
        // Above -30 dB saturates
        assert_eq!(magnitude_to_byte(1.0, -100.0, -30.0), 255);
        // Degenerate range
        assert_eq!(magnitude_to_byte(1.0, -30.0, -30.0), 0);
    }

    #[test]
    fn test_sine_peaks_in_its_bin() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig {
            smoothing: 0.0,
            ..Default::default()
        });
        let sample_rate = 48_000.0;
        // Bin 32 of 512 at 48 kHz
        let samples = sine(1500.0, sample_rate, 1024);
        let bytes = analyser.analyse(&samples).to_vec();

        assert_eq!(bytes.len(), 512);
        let peak = bytes
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
        assert!(bytes[32] > 50);
        assert!(bytes[31] < bytes[32] && bytes[33] < bytes[32]);
        assert_eq!(bytes[200], 0);
    }

    #[test]
    fn test_silence_is_zero() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        assert!(analyser.analyse(&[0.0; 1024]).iter().all(|&b| b == 0));
        assert!(analyser.analyse(&[]).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_smoothing_lags_behind_input() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let loud = sine(1500.0, 48_000.0, 1024);
        let first = analyser.analyse(&loud)[32];
        let second = analyser.analyse(&loud)[32];
        assert!(second > first);

        analyser.reset();
        assert_eq!(analyser.analyse(&loud)[32], first);
    }
}
