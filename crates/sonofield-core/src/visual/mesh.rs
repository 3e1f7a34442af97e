//! Rest-shape meshes for the central objects
//!
//! Rest positions and normals are built once and never mutated; every frame
//! the deformed positions are written into a separate output buffer.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Immutable reference geometry
#[derive(Debug, Clone, PartialEq)]
pub struct RestMesh {
    /// Vertex positions in object space
    pub positions: Vec<Vec3>,
    /// Unit normals, one per vertex
    pub normals: Vec<Vec3>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl RestMesh {
    /// Axis-aligned box centred on the origin, 4 vertices per face
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
                positions.push((normal + u * su + v * sv) * h);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Torus in the XY plane around the Z axis
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(3);
        let vertex_count = ((radial_segments + 1) * (tubular_segments + 1)) as usize;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let ring = radius + tube * v.cos();
                let position = Vec3::new(ring * u.cos(), ring * u.sin(), tube * v.sin());
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                positions.push(position);
                normals.push((position - center).normalize_or_zero());
            }
        }

        let stride = tubular_segments + 1;
        let mut indices = Vec::with_capacity((radial_segments * tubular_segments * 6) as usize);
        for j in 1..=radial_segments {
            for i in 1..=tubular_segments {
                let a = stride * j + i - 1;
                let b = stride * (j - 1) + i - 1;
                let c = stride * (j - 1) + i;
                let d = stride * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Which band-group intensities push a mesh outward, and how hard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DeformationDrive {
    /// Weight on the low intensity (bands 0 and 1)
    pub low: f32,
    /// Weight on the mid intensity (bands 4 and 5)
    pub mid: f32,
    /// Weight on the high intensity (bands 8 and 9)
    pub high: f32,
}

/// A central mesh with its rest shape and deformation drive
#[derive(Debug, Clone)]
pub struct CentralObject {
    /// Identifier used by the renderer
    pub name: &'static str,
    /// Undeformed geometry
    pub rest: RestMesh,
    /// Band weights
    pub drive: DeformationDrive,
}

impl CentralObject {
    /// The unit cube, driven by lows and mids
    pub fn cube() -> Self {
        Self {
            name: "cube",
            rest: RestMesh::cuboid(Vec3::ONE),
            drive: DeformationDrive {
                low: 0.3,
                mid: 0.2,
                high: 0.0,
            },
        }
    }

    /// The ring around the cube, driven by highs
    pub fn ring() -> Self {
        Self {
            name: "ring",
            rest: RestMesh::torus(1.5, 0.13, 32, 128),
            drive: DeformationDrive {
                low: 0.0,
                mid: 0.0,
                high: 0.4,
            },
        }
    }

    /// Default scene: cube and ring
    pub fn default_set() -> Vec<Self> {
        vec![Self::cube(), Self::ring()]
    }
}
