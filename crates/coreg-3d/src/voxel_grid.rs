use std::collections::HashMap;

use crate::linalg::euclidean_distance;

/// A regular 3D grid for decimating point sets.
///
/// Decimation retains at most one point per occupied voxel: the point
/// closest to the voxel's geometric center. This differs from
/// centroid-based downsampling in that every output point is one of the
/// input points.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// Edge length of each voxel.
    res: f64,
}

impl VoxelGrid {
    /// Creates a new `VoxelGrid` with the given voxel edge length.
    ///
    /// # Panics
    /// Panics if `res` is non-positive.
    pub fn new(res: f64) -> Self {
        if res <= 0.0 {
            panic!("Voxel resolution must be positive");
        }
        VoxelGrid { res }
    }

    /// Gets the voxel edge length.
    pub fn resolution(&self) -> f64 {
        self.res
    }

    /// Decimates a point set, keeping per occupied voxel the point nearest
    /// the voxel center.
    ///
    /// The grid is anchored at the bounding-box minimum shifted down by half
    /// a voxel, so every point falls strictly inside a cell. Output order
    /// follows voxel enumeration order and is unspecified to callers.
    ///
    /// # Arguments
    /// * `points` - The input point set.
    ///
    /// # Returns
    /// The retained points, at most one per occupied voxel.
    pub fn decimate(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        if points.is_empty() {
            return Vec::new();
        }

        let mut origin = points[0];
        for point in points {
            for d in 0..3 {
                origin[d] = origin[d].min(point[d]);
            }
        }
        for val in origin.iter_mut() {
            *val -= self.res / 2.0;
        }

        // per voxel, the index of the point nearest the cell center so far
        let mut grid: HashMap<(i64, i64, i64), (usize, f64)> = HashMap::new();

        for (i, point) in points.iter().enumerate() {
            let key = (
                ((point[0] - origin[0]) / self.res).floor() as i64,
                ((point[1] - origin[1]) / self.res).floor() as i64,
                ((point[2] - origin[2]) / self.res).floor() as i64,
            );
            let center = [
                origin[0] + (key.0 as f64 + 0.5) * self.res,
                origin[1] + (key.1 as f64 + 0.5) * self.res,
                origin[2] + (key.2 as f64 + 0.5) * self.res,
            ];
            let dist = euclidean_distance(point, &center);
            let entry = grid.entry(key).or_insert((i, dist));
            if dist < entry.1 {
                *entry = (i, dist);
            }
        }

        grid.into_values().map(|(i, _)| points[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut points: Vec<[f64; 3]>) -> Vec<[f64; 3]> {
        points.sort_by(|a, b| a.partial_cmp(b).unwrap());
        points
    }

    #[test]
    fn test_single_point() {
        let grid = VoxelGrid::new(1.0);
        let points = vec![[0.3, -0.2, 5.0]];
        assert_eq!(grid.decimate(&points), points);
    }

    #[test]
    fn test_cluster_and_outlier() {
        // two points share a voxel, the third sits far away
        let grid = VoxelGrid::new(1.0);
        let points = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [5.0, 5.0, 5.0]];
        let decimated = sorted(grid.decimate(&points));
        assert_eq!(decimated.len(), 2);
        assert_eq!(decimated[0], [0.0, 0.0, 0.0]);
        assert_eq!(decimated[1], [5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_keeps_point_nearest_center() {
        // bin origin is min - res/2, so the cell center lies on the minimum
        // point; 0.2 must win over 0.4
        let grid = VoxelGrid::new(1.0);
        let points = vec![[0.4, 0.0, 0.0], [0.2, 0.0, 0.0]];
        let decimated = grid.decimate(&points);
        assert_eq!(decimated, vec![[0.2, 0.0, 0.0]]);
    }

    #[test]
    fn test_idempotent() {
        let grid = VoxelGrid::new(1.0);
        let points = vec![
            [0.0, 0.0, 0.0],
            [0.1, 0.0, 0.0],
            [5.0, 5.0, 5.0],
            [2.0, 0.5, -1.0],
            [2.2, 0.5, -1.0],
        ];
        let once = grid.decimate(&points);
        let twice = grid.decimate(&once);
        assert_eq!(sorted(once), sorted(twice));
    }

    #[test]
    fn test_coplanar_points() {
        let grid = VoxelGrid::new(0.5);
        let points = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 2.0, 0.0]];
        assert_eq!(grid.decimate(&points).len(), 3);
    }

    #[test]
    #[should_panic]
    fn test_invalid_resolution() {
        VoxelGrid::new(0.0);
    }
}
