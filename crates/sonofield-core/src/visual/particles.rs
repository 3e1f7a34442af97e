//! Particle field rest layout and band assignment.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::bands::BAND_COUNT;

/// Shape of the particle shell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleLayout {
    /// Number of particles
    pub count: usize,
    /// Inner radius of the shell
    pub inner_radius: f32,
    /// Radial thickness of the shell
    pub thickness: f32,
    /// RNG seed for the rest positions
    pub seed: u64,
}

impl Default for ParticleLayout {
    fn default() -> Self {
        Self {
            count: 400,
            inner_radius: 2.2,
            thickness: 0.5,
            seed: 0x50_4e_49_43,
        }
    }
}

/// Band that particle `index` of `count` follows.
///
/// Contiguous blocks of `count / 16` particles per band; the remainder joins
/// the last band. With fewer particles than bands each particle gets its own
/// band.
pub fn band_for_particle(index: usize, count: usize) -> usize {
    let block = count / BAND_COUNT;
    if block == 0 {
        return index.min(BAND_COUNT - 1);
    }
    (index / block).min(BAND_COUNT - 1)
}

/// Immutable rest layout of the particle field
#[derive(Debug, Clone)]
pub struct ParticleField {
    rest: Vec<Vec3>,
    directions: Vec<Vec3>,
    bands: Vec<usize>,
}

impl ParticleField {
    /// Place `layout.count` particles uniformly on the spherical shell
    pub fn new(layout: &ParticleLayout) -> Self {
        let mut rng = StdRng::seed_from_u64(layout.seed);
        let thickness = layout.thickness.max(0.0);

        let rest: Vec<Vec3> = (0..layout.count)
            .map(|_| {
                let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
                let theta = 2.0 * PI * rng.random::<f32>();
                let r = layout.inner_radius + rng.random::<f32>() * thickness;
                Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            })
            .collect();

        Self::from_rest_positions(rest)
    }

    /// Build a field from explicit rest positions
    pub fn from_rest_positions(rest: Vec<Vec3>) -> Self {
        let count = rest.len();
        let directions = rest
            .iter()
            .map(|p| {
                let dir = p.normalize_or_zero();
                if dir == Vec3::ZERO {
                    // A particle at the origin still needs an outward axis
                    Vec3::Y
                } else {
                    dir
                }
            })
            .collect();
        let bands = (0..count).map(|i| band_for_particle(i, count)).collect();

        Self {
            rest,
            directions,
            bands,
        }
    }

    /// Number of particles
    pub fn len(&self) -> usize {
        self.rest.len()
    }

    /// True when the field has no particles
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Rest positions
    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest
    }

    /// Unit outward direction of each particle
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Band assignment of each particle
    pub fn bands(&self) -> &[usize] {
        &self.bands
    }
}
