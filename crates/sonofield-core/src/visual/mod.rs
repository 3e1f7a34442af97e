//! Visual mapping stage
//!
//! Rest geometry is built once; the mapper writes deformed copies into
//! per-frame output buffers.

pub mod mapper;
pub mod mesh;
pub mod particles;
pub mod trails;

pub use mapper::{
    central_appearance, deform_mesh, map_particles, CentralMappingSettings, MaterialUpdate,
    ParticleMappingSettings, SpectrumIntensity,
};
pub use mesh::{CentralObject, DeformationDrive, RestMesh};
pub use particles::{band_for_particle, ParticleField, ParticleLayout};
pub use trails::{TrailArena, TrailSettings};
