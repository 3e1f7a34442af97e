//! Uniform spatial grid over particle positions

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grid tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialSettings {
    /// Rebuild the grid on every executed frame
    pub enabled: bool,
    /// Edge length of a cubic cell
    pub cell_size: f32,
}

impl Default for SpatialSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cell_size: 5.0,
        }
    }
}

/// Particle indices bucketed by cell
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
    positions: Vec<Vec3>,
}

impl SpatialGrid {
    /// Create an empty grid. Non-positive sizes fall back to 1.0.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: Self::sanitize_cell_size(cell_size),
            cells: HashMap::new(),
            positions: Vec::new(),
        }
    }

    fn sanitize_cell_size(cell_size: f32) -> f32 {
        if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        }
    }

    fn cell_of(&self, p: Vec3) -> IVec3 {
        (p / self.cell_size).floor().as_ivec3()
    }

    /// Re-bucket `positions`, optionally with a new cell size
    pub fn rebuild(&mut self, positions: &[Vec3], cell_size: f32) {
        self.cell_size = Self::sanitize_cell_size(cell_size);
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.positions.clear();
        self.positions.extend_from_slice(positions);

        for (i, p) in positions.iter().enumerate() {
            if !p.is_finite() {
                continue;
            }
            let cell = self.cell_of(*p);
            self.cells.entry(cell).or_default().push(i);
        }
        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Indices of particles within `range` of `point`, in ascending order
    pub fn particles_in_range(&self, point: Vec3, range: f32) -> Vec<usize> {
        if !point.is_finite() || !range.is_finite() || range < 0.0 {
            return Vec::new();
        }
        let min = self.cell_of(point - Vec3::splat(range));
        let max = self.cell_of(point + Vec3::splat(range));
        let range_sq = range * range;

        let mut found = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    let Some(bucket) = self.cells.get(&IVec3::new(x, y, z)) else {
                        continue;
                    };
                    found.extend(
                        bucket
                            .iter()
                            .copied()
                            .filter(|&i| self.positions[i].distance_squared(point) <= range_sq),
                    );
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(SpatialSettings::default().cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_query() {
        let mut grid = SpatialGrid::default();
        let positions = [
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(4.9, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(-3.0, -3.0, 0.0),
        ];
        grid.rebuild(&positions, 5.0);

        assert_eq!(grid.particles_in_range(Vec3::ZERO, 1.5), vec![0, 1]);
        assert_eq!(grid.particles_in_range(Vec3::new(5.5, 0.0, 0.0), 1.0), vec![2, 3]);
        assert_eq!(grid.particles_in_range(Vec3::ZERO, 10.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_negative_coordinates_bucket_below_zero() {
        let mut grid = SpatialGrid::new(5.0);
        grid.rebuild(&[Vec3::splat(-0.1), Vec3::splat(0.1)], 5.0);
        assert_eq!(grid.occupied_cells(), 2);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = SpatialGrid::new(5.0);
        grid.rebuild(&[Vec3::ZERO], 5.0);
        grid.rebuild(&[Vec3::splat(100.0)], 5.0);
        assert!(grid.particles_in_range(Vec3::ZERO, 1.0).is_empty());
        assert_eq!(grid.occupied_cells(), 1);
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut grid = SpatialGrid::new(0.0);
        assert_eq!(grid.cell_size(), 1.0);
        grid.rebuild(&[Vec3::NAN, Vec3::ZERO], -2.0);
        assert_eq!(grid.particles_in_range(Vec3::ZERO, 0.5), vec![1]);
        assert!(grid.particles_in_range(Vec3::ZERO, -1.0).is_empty());
        assert!(grid.particles_in_range(Vec3::NAN, 1.0).is_empty());
    }
}
