//! Adaptive quality - frame-rate driven workload tiers
//!
//! The controller samples the frame rate once per accumulated second of
//! playback and moves at most one level per sample. Each level scales the
//! active particle count and trail length and sets how many frames pass
//! between pipeline runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Below `target * DOWNGRADE_RATIO` the level drops
pub const DOWNGRADE_RATIO: f32 = 0.7;
/// Above `target * UPGRADE_RATIO` the level rises
pub const UPGRADE_RATIO: f32 = 1.3;
/// Seconds of frame time per fps sample
pub const SAMPLE_WINDOW_SECONDS: f32 = 1.0;

/// Workload tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Full workload
    #[default]
    High,
    /// Reduced workload
    Medium,
    /// Minimum workload
    Low,
}

impl QualityLevel {
    /// One step cheaper, saturating at Low
    pub fn lower(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }

    /// One step richer, saturating at High
    pub fn higher(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one level costs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Share of particles that are updated and drawn (0.0 - 1.0)
    pub particle_fraction: f32,
    /// Multiplier on the configured trail length
    pub trail_scale: f32,
    /// Run the pipeline on every n-th frame
    pub update_divisor: u32,
}

impl QualitySettings {
    /// Number of active particles out of `total`
    pub fn active_particles(&self, total: usize) -> usize {
        let fraction = if self.particle_fraction.is_finite() {
            self.particle_fraction.clamp(0.0, 1.0)
        } else {
            1.0
        };
        ((total as f32 * fraction).floor() as usize).min(total)
    }

    /// Trail length for a configured base length, never below one sample
    pub fn trail_length(&self, base: usize) -> usize {
        let scale = if self.trail_scale.is_finite() {
            self.trail_scale.max(0.0)
        } else {
            1.0
        };
        ((base as f32 * scale).round() as usize).max(1)
    }
}

/// Adaptive quality tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Let the controller change levels
    pub adaptive: bool,
    /// Frame rate the controller aims for
    pub target_fps: f32,
    /// Level at construction
    pub initial_level: QualityLevel,
    /// High tier
    pub high: QualitySettings,
    /// Medium tier
    pub medium: QualitySettings,
    /// Low tier
    pub low: QualitySettings,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            adaptive: true,
            target_fps: 30.0,
            initial_level: QualityLevel::High,
            high: QualitySettings {
                particle_fraction: 1.0,
                trail_scale: 1.0,
                update_divisor: 1,
            },
            medium: QualitySettings {
                particle_fraction: 0.7,
                trail_scale: 0.5,
                update_divisor: 2,
            },
            low: QualitySettings {
                particle_fraction: 0.4,
                trail_scale: 0.25,
                update_divisor: 3,
            },
        }
    }
}

impl QualityConfig {
    /// Settings for one level
    pub fn settings(&self, level: QualityLevel) -> QualitySettings {
        match level {
            QualityLevel::High => self.high,
            QualityLevel::Medium => self.medium,
            QualityLevel::Low => self.low,
        }
    }
}

/// Frame-rate driven level state machine and frame-skip gate
#[derive(Debug, Clone)]
pub struct QualityController {
    level: QualityLevel,
    window_frames: u32,
    window_seconds: f32,
    frame_counter: u64,
    last_fps: Option<f32>,
}

impl QualityController {
    /// Create a controller at `level`
    pub fn new(level: QualityLevel) -> Self {
        Self {
            level,
            window_frames: 0,
            window_seconds: 0.0,
            frame_counter: 0,
            last_fps: None,
        }
    }

    /// Account for one displayed frame of `delta_seconds`.
    ///
    /// Every time a full second has accumulated the measured fps is fed to
    /// [`evaluate`](Self::evaluate). Returns the new level when it changed.
    pub fn record_frame(
        &mut self,
        delta_seconds: f32,
        config: &QualityConfig,
    ) -> Option<QualityLevel> {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return None;
        }
        self.window_frames += 1;
        self.window_seconds += delta_seconds;
        if self.window_seconds < SAMPLE_WINDOW_SECONDS {
            return None;
        }

        let fps = self.window_frames as f32 / self.window_seconds;
        self.window_frames = 0;
        self.window_seconds = 0.0;
        self.last_fps = Some(fps);
        debug!("Measured {:.1} fps at {} quality", fps, self.level);
        self.evaluate(fps, config)
    }

    /// Apply one fps sample. Moves at most one level.
    pub fn evaluate(&mut self, fps: f32, config: &QualityConfig) -> Option<QualityLevel> {
        if !config.adaptive || !fps.is_finite() {
            return None;
        }
        let next = if fps < config.target_fps * DOWNGRADE_RATIO {
            self.level.lower()
        } else if fps > config.target_fps * UPGRADE_RATIO {
            self.level.higher()
        } else {
            self.level
        };
        if next == self.level {
            return None;
        }

        info!(
            "Quality {} -> {} ({:.1} fps, target {:.1})",
            self.level, next, fps, config.target_fps
        );
        self.level = next;
        // Restart the skip cadence so the first frame at the new level runs
        self.frame_counter = 0;
        Some(next)
    }

    /// Frame-skip gate. Call once per displayed frame while playing.
    pub fn should_run(&mut self, config: &QualityConfig) -> bool {
        let divisor = u64::from(config.settings(self.level).update_divisor.max(1));
        let run = self.frame_counter % divisor == 0;
        self.frame_counter = self.frame_counter.wrapping_add(1);
        run
    }

    /// Current level
    pub fn level(&self) -> QualityLevel {
        self.level
    }

    /// Settings of the current level
    pub fn settings(&self, config: &QualityConfig) -> QualitySettings {
        config.settings(self.level)
    }

    /// Most recent fps sample
    pub fn last_fps(&self) -> Option<f32> {
        self.last_fps
    }

    /// Drop the partial measurement window (e.g. after a pause)
    pub fn reset_window(&mut self) {
        self.window_frames = 0;
        self.window_seconds = 0.0;
    }
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(QualityLevel::High)
    }
}
