use kiddo::immutable::float::kdtree::ImmutableKdTree;

/// Target size from which the kd-tree pays for its build cost.
const KDTREE_MIN_TARGET: usize = 64;

/// Nearest-neighbor distance queries over a fixed target point set.
///
/// The two variants are interchangeable: they return the same distances (to
/// floating tolerance) for the same inputs, and which one is used is purely
/// a performance decision made at construction time.
pub enum NearestNeighborIndex {
    /// Spatial-tree index, worthwhile for larger targets.
    KdTree(ImmutableKdTree<f64, u32, 3, 32>),
    /// All-pairs scan over an owned copy of the target.
    BruteForce(Vec<[f64; 3]>),
}

impl NearestNeighborIndex {
    /// Build an index over the target points, choosing the implementation by
    /// target size.
    pub fn new(target: &[[f64; 3]]) -> Self {
        if target.len() >= KDTREE_MIN_TARGET {
            Self::kd_tree(target)
        } else {
            Self::brute_force(target)
        }
    }

    /// Build the kd-tree variant.
    pub fn kd_tree(target: &[[f64; 3]]) -> Self {
        Self::KdTree(ImmutableKdTree::new_from_slice(target))
    }

    /// Build the brute-force variant.
    pub fn brute_force(target: &[[f64; 3]]) -> Self {
        Self::BruteForce(target.to_vec())
    }

    /// For each source point, the Euclidean distance to its nearest target
    /// point.
    pub fn nearest_distances(&self, src_points: &[[f64; 3]]) -> Vec<f64> {
        match self {
            Self::KdTree(tree) => src_points
                .iter()
                .map(|p| tree.nearest_one::<kiddo::SquaredEuclidean>(p).distance.sqrt())
                .collect(),
            Self::BruteForce(target) => src_points
                .iter()
                .map(|p| {
                    target
                        .iter()
                        .map(|q| {
                            (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2)
                        })
                        .fold(f64::INFINITY, f64::min)
                        .sqrt()
                })
                .collect(),
        }
    }
}
