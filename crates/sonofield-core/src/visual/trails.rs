//! Motion trails - fixed-capacity arena indexed by particle
//!
//! One contiguous buffer holds `length` (position, colour) samples per
//! particle. Slot 0 is the newest sample. Changing the length or decay
//! reallocates the whole arena; old trail content is dropped.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Upper bound on stored samples (positions and colours together)
const MAX_SAMPLES: usize = 1 << 24;

/// Trail tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailSettings {
    /// Trails on/off
    pub enabled: bool,
    /// Samples per particle at the highest quality level
    pub length: usize,
    /// Line opacity handed to the renderer (0.0 - 1.0)
    pub opacity: f32,
    /// Colour multiplier applied each time a sample ages by one slot
    pub decay: f32,
}

impl Default for TrailSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            length: 20,
            opacity: 0.8,
            decay: 0.95,
        }
    }
}

/// Per-particle ring of trail samples
#[derive(Debug, Clone)]
pub struct TrailArena {
    particle_count: usize,
    /// Length asked for; differs from `length` only after a fallback
    requested_length: usize,
    length: usize,
    decay: f32,
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl TrailArena {
    /// Allocate a zeroed arena. A length whose buffer would overflow or
    /// exceed the sample cap falls back to one sample per particle.
    pub fn new(particle_count: usize, requested_length: usize, decay: f32) -> Self {
        let (length, total) = match particle_count.checked_mul(requested_length) {
            Some(total) if total.checked_mul(2).is_some_and(|n| n <= MAX_SAMPLES) => {
                (requested_length, total)
            }
            _ => {
                warn!(
                    "Trail length {} too large for {} particles, using 1",
                    requested_length, particle_count
                );
                (1, particle_count)
            }
        };
        Self {
            particle_count,
            requested_length,
            length,
            decay,
            positions: vec![Vec3::ZERO; total],
            colors: vec![Vec3::ZERO; total],
        }
    }

    /// Reallocate when the shape or decay differs. Returns true if it did.
    pub fn resize(&mut self, particle_count: usize, length: usize, decay: f32) -> bool {
        if self.particle_count == particle_count
            && self.requested_length == length
            && self.decay == decay
        {
            return false;
        }
        debug!(
            "Reallocating trail arena: {} particles x {} samples (was {} x {})",
            particle_count, length, self.particle_count, self.length
        );
        *self = Self::new(particle_count, length, decay);
        true
    }

    /// Zero every sample without changing the shape
    pub fn reset(&mut self) {
        self.positions.fill(Vec3::ZERO);
        self.colors.fill(Vec3::ZERO);
    }

    /// Age every trail of the first `active` particles by one slot and write
    /// the particles' current state into slot 0.
    pub fn push_frame(&mut self, positions: &[Vec3], colors: &[Vec3], active: usize) {
        let len = self.length;
        if len == 0 {
            return;
        }
        let active = active
            .min(self.particle_count)
            .min(positions.len())
            .min(colors.len());

        for particle in 0..active {
            let range = particle * len..(particle + 1) * len;
            let trail_positions = &mut self.positions[range.clone()];
            let trail_colors = &mut self.colors[range];

            trail_positions.copy_within(0..len - 1, 1);
            trail_colors.copy_within(0..len - 1, 1);
            for color in &mut trail_colors[1..] {
                *color *= self.decay;
            }

            trail_positions[0] = positions[particle];
            trail_colors[0] = colors[particle];
        }
    }

    /// Trail samples of one particle, newest first
    pub fn trail(&self, particle: usize) -> Option<(&[Vec3], &[Vec3])> {
        if particle >= self.particle_count {
            return None;
        }
        let range = particle * self.length..(particle + 1) * self.length;
        Some((&self.positions[range.clone()], &self.colors[range]))
    }

    /// Samples per particle
    pub fn length(&self) -> usize {
        self.length
    }

    /// Particles covered by the arena
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Colour decay per slot
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// All positions, particle-major
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// All colours, particle-major
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }
}
