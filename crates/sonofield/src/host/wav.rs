//! WAV decoding to a mono f32 track

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Decoded audio, downmixed to one channel
#[derive(Debug, Clone)]
pub struct Track {
    /// Samples per second
    pub sample_rate: u32,
    /// Mono samples in -1..1
    pub samples: Vec<f32>,
}

impl Track {
    /// Open and decode a WAV file
    pub fn open(path: &Path) -> Result<Self> {
        let reader =
            WavReader::open(path).with_context(|| format!("Failed to open WAV file {:?}", path))?;
        let track = Self::from_reader(reader)
            .with_context(|| format!("Failed to decode WAV file {:?}", path))?;
        info!(
            "Loaded {:?}: {} Hz, {:.1} s",
            path,
            track.sample_rate,
            track.duration_seconds()
        );
        Ok(track)
    }

    /// Decode from any WAV reader
    pub fn from_reader<R: Read>(reader: WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        if spec.channels == 0 {
            bail!("WAV file declares zero channels");
        }
        if spec.sample_rate == 0 {
            bail!("WAV file declares a zero sample rate");
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| if v.is_finite() { v } else { 0.0 }))
                .collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        Ok(Self {
            sample_rate: spec.sample_rate,
            samples: downmix(&interleaved, spec.channels as usize),
        })
    }

    /// Length in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Copy the `len` samples that end at `end` into `out`, zero-padding
    /// before the start of the track.
    pub fn window_ending_at(&self, end: usize, len: usize, out: &mut Vec<f32>) {
        out.clear();
        out.resize(len, 0.0);
        let end = end.min(self.samples.len());
        let start = end.saturating_sub(len);
        let available = &self.samples[start..end];
        out[len - available.len()..].copy_from_slice(available);
    }
}

/// Average interleaved frames down to one channel
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn test_downmix_stereo() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        assert_eq!(downmix(&[1.0, 1.0, 1.0], 2), vec![1.0]);
        assert_eq!(downmix(&[0.25, 0.75], 1), vec![0.25, 0.75]);
    }

    #[test]
    fn test_open_int16_stereo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16_384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let track = Track::open(&path).unwrap();
        assert_eq!(track.sample_rate, 22_050);
        assert_eq!(track.samples.len(), 100);
        assert!((track.samples[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Track::open(&dir.path().join("missing.wav")).is_err());
    }

    #[test]
    fn test_window_zero_pads_start() {
        let track = Track {
            sample_rate: 8,
            samples: vec![1.0, 2.0, 3.0],
        };
        let mut out = Vec::new();
        track.window_ending_at(2, 4, &mut out);
        assert_eq!(out, vec![0.0, 0.0, 1.0, 2.0]);

        track.window_ending_at(10, 2, &mut out);
        assert_eq!(out, vec![2.0, 3.0]);
    }
}
