use coreg_3d::linalg::transform_points3d;
use coreg_3d::transforms::rotation3d;

use crate::error::FitError;
use crate::knn::NearestNeighborIndex;
use crate::params::{FitSolution, ParamInfo, Scale};
use crate::solver::{least_squares, SolverOptions};

/// Component combinations the closest-point fitter implements.
const SUPPORTED: [(bool, bool, Scale); 4] = [
    (true, false, Scale::None),
    (true, false, Scale::Uniform),
    (true, false, Scale::PerAxis),
    (true, true, Scale::None),
];

/// Options controlling a closest-point fit.
#[derive(Debug, Clone)]
pub struct CloudFitOptions {
    /// Estimate rotation angles.
    pub rotate: bool,
    /// Estimate a translation.
    pub translate: bool,
    /// Scale parameters to estimate; uniform and per-axis scaling are both
    /// supported here.
    pub scale: Scale,
    /// Starting parameters; the identity transform when absent.
    pub initial_guess: Option<Vec<f64>>,
    /// Passed through to the least-squares solver. The default uses a
    /// coarse finite-difference step (0.01) because the nearest-distance
    /// residual is not smooth at correspondence changes.
    pub solver: SolverOptions,
}

impl Default for CloudFitOptions {
    fn default() -> Self {
        Self {
            rotate: true,
            translate: true,
            scale: Scale::None,
            initial_guess: None,
            solver: SolverOptions::default().with_fd_step(0.01),
        }
    }
}

impl CloudFitOptions {
    /// Create default options: rotation and translation, no scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale parameters to estimate.
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the starting parameters.
    pub fn with_initial_guess(mut self, x0: Vec<f64>) -> Self {
        self.initial_guess = Some(x0);
        self
    }

    /// Set the solver options.
    pub fn with_solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }
}

/// Apply the parameterized transform for a scale-bearing descriptor without
/// building a 4x4 matrix: the rotation rows are scaled element-wise, which
/// equals the `scaling * rotation` composition.
fn transform_row_scaled(
    params: &[f64],
    scale: &[f64; 3],
    src_pts: &[[f64; 3]],
    dst_pts: &mut [[f64; 3]],
) {
    let rot = rotation3d(params[0], params[1], params[2]);
    for (src, dst) in src_pts.iter().zip(dst_pts.iter_mut()) {
        for d in 0..3 {
            dst[d] = scale[d] * (rot[d][0] * src[0] + rot[d][1] * src[1] + rot[d][2] * src[2]);
        }
    }
}

/// Find the transform that minimizes the squared distance from each source
/// point to its closest target point.
///
/// Unlike [`crate::fit_matched_points`], no correspondence between the point
/// sets is assumed and they may differ in length. The residual for each
/// source point is the distance to its nearest target point, answered by a
/// [`NearestNeighborIndex`] built once over the target.
///
/// The target is assumed to be dense relative to the expected residual
/// alignment error; against a sparse target the nearest-point distance is a
/// poor proxy for the true cloud-to-cloud distance and the fit degrades
/// accordingly. This is an accuracy caveat, not a checked precondition.
///
/// # Arguments
///
/// * `src_pts` - Points the transform is applied to.
/// * `tgt_pts` - Points the source should land on.
/// * `opts` - Fit options.
///
/// # Returns
///
/// The fitted parameter vector and transform as a [`FitSolution`].
///
/// # Errors
///
/// [`FitError::ShapeMismatch`] if either point set is empty;
/// [`FitError::UnsupportedConfiguration`] if the requested component
/// combination is not implemented.
pub fn fit_point_cloud(
    src_pts: &[[f64; 3]],
    tgt_pts: &[[f64; 3]],
    opts: &CloudFitOptions,
) -> Result<FitSolution, FitError> {
    if src_pts.is_empty() || tgt_pts.is_empty() {
        return Err(FitError::ShapeMismatch {
            src: src_pts.len(),
            tgt: tgt_pts.len(),
        });
    }

    let info = ParamInfo {
        rotate: opts.rotate,
        translate: opts.translate,
        scale: opts.scale,
    };
    if !SUPPORTED.contains(&(info.rotate, info.translate, info.scale)) {
        return Err(FitError::UnsupportedConfiguration {
            rotate: info.rotate,
            translate: info.translate,
            scale: info.scale.n_params(),
        });
    }

    let x0 = info.starting_params(opts.initial_guess.as_ref())?;
    let index = NearestNeighborIndex::new(tgt_pts);

    let residual = |x: &[f64]| {
        let mut est = vec![[0.0; 3]; src_pts.len()];
        match info.scale {
            Scale::None => {
                let trans = info.matrix_unchecked(x);
                transform_points3d(src_pts, &trans, &mut est);
            }
            Scale::Uniform => {
                let s = x[3];
                transform_row_scaled(x, &[s, s, s], src_pts, &mut est);
            }
            Scale::PerAxis => {
                transform_row_scaled(x, &[x[3], x[4], x[5]], src_pts, &mut est);
            }
        }
        index.nearest_distances(&est)
    };

    let solved = least_squares(residual, &x0, &opts.solver)?;
    log::debug!(
        "closest-point fit: {} iterations, {:?}, cost {:.3e}",
        solved.iterations,
        solved.termination,
        solved.final_cost
    );

    let trans = info.matrix_unchecked(&solved.params);
    Ok(FitSolution::new(
        solved.params,
        info,
        trans,
        solved.iterations,
        solved.termination,
    ))
}
