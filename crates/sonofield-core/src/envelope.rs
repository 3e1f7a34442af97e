//! ADSR envelope generator
//!
//! A time-driven gain curve that runs independently of the audio data.
//! Playback start triggers it, pause releases it. The value is advanced only
//! by [`EnvelopeGenerator::update`].

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest stage duration used as a divisor (seconds)
const MIN_STAGE_SECONDS: f32 = 1e-6;

/// Envelope phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EnvelopeState {
    /// Rising toward 1.0
    Attack,
    /// Falling from 1.0 toward the sustain level
    Decay,
    /// Holding at the sustain level
    Sustain,
    /// Falling toward 0.0, terminal until the next trigger
    #[default]
    Release,
}

/// ADSR time constants and sustain level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Attack time in seconds
    pub attack: f32,
    /// Decay time in seconds
    pub decay: f32,
    /// Sustain level (0.0 - 1.0)
    pub sustain: f32,
    /// Release time in seconds
    pub release: f32,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.5,
            sustain: 0.7,
            release: 1.0,
        }
    }
}

/// Four-state ADSR envelope
#[derive(Debug, Clone, Default)]
pub struct EnvelopeGenerator {
    state: EnvelopeState,
    value: f32,
    /// Seconds spent in the current run since the last trigger
    elapsed: f32,
}

impl EnvelopeGenerator {
    /// Create an envelope at rest (Release, value 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter Attack and restart the time reference. The value is kept.
    pub fn trigger(&mut self) {
        self.state = EnvelopeState::Attack;
        self.elapsed = 0.0;
        debug!("Envelope triggered at value {:.3}", self.value);
    }

    /// Enter Release; the value continues from where it is.
    pub fn release(&mut self) {
        self.state = EnvelopeState::Release;
        debug!("Envelope released at value {:.3}", self.value);
    }

    /// Advance by `delta_seconds` using the current settings.
    ///
    /// Negative or non-finite deltas are treated as zero, and a zero delta
    /// leaves the state untouched.
    pub fn update(&mut self, delta_seconds: f32, settings: &EnvelopeSettings) -> f32 {
        let dt = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        if dt == 0.0 {
            return self.value;
        }
        self.elapsed += dt;

        let sustain = settings.sustain;
        match self.state {
            EnvelopeState::Attack => {
                self.value += dt / settings.attack.max(MIN_STAGE_SECONDS);
                if self.value >= 1.0 {
                    self.value = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.value -= dt / settings.decay.max(MIN_STAGE_SECONDS) * (1.0 - sustain);
                if self.value <= sustain {
                    self.value = sustain;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {
                self.value = sustain;
            }
            EnvelopeState::Release => {
                // A zero sustain level would stall the release, fall over a unit span instead
                let span = if sustain > 0.0 { sustain } else { 1.0 };
                self.value -= dt / settings.release.max(MIN_STAGE_SECONDS) * span;
                if self.value <= 0.0 {
                    self.value = 0.0;
                }
            }
        }

        if !self.value.is_finite() {
            self.value = 0.0;
        }
        self.value
    }

    /// Current value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current phase
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Seconds advanced since the last trigger
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
