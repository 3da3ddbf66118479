use coreg_3d::linalg::{euclidean_distance, transform_points3d};

use crate::error::FitError;
use crate::params::{FitSolution, ParamInfo, Scale};
use crate::solver::{least_squares, SolverOptions};

/// Component combinations the matched-point fitter implements.
const SUPPORTED: [(bool, bool, Scale); 4] = [
    (true, false, Scale::None),
    (true, false, Scale::Uniform),
    (true, true, Scale::None),
    (true, true, Scale::Uniform),
];

/// Options controlling a matched-point fit.
#[derive(Debug, Clone)]
pub struct MatchedFitOptions {
    /// Estimate rotation angles.
    pub rotate: bool,
    /// Estimate a translation.
    pub translate: bool,
    /// Scale parameters to estimate; at most a uniform scale is supported
    /// here.
    pub scale: Scale,
    /// When set, any per-point residual above this value after the fit is a
    /// hard error.
    pub tolerance: Option<f64>,
    /// Starting parameters; the identity transform when absent.
    pub initial_guess: Option<Vec<f64>>,
    /// Passed through to the least-squares solver.
    pub solver: SolverOptions,
}

impl Default for MatchedFitOptions {
    fn default() -> Self {
        Self {
            rotate: true,
            translate: true,
            scale: Scale::None,
            tolerance: None,
            initial_guess: None,
            solver: SolverOptions::default(),
        }
    }
}

impl MatchedFitOptions {
    /// Create default options: rotation and translation, no scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scale parameters to estimate.
    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the post-fit residual tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
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

/// Find the transform that minimizes the squared distance between two
/// index-aligned point sets.
///
/// Each target point must correspond to the source point with the same
/// index. The residual is the per-coordinate difference between the target
/// and the transformed source, and the estimated components compose as
/// documented on [`ParamInfo::params_to_matrix`].
///
/// # Arguments
///
/// * `src_pts` - Points the transform is applied to.
/// * `tgt_pts` - Points the source should land on, same length as the
///   source.
/// * `opts` - Fit options.
///
/// # Returns
///
/// The fitted parameter vector and transform as a [`FitSolution`].
///
/// # Errors
///
/// [`FitError::ShapeMismatch`] if the point sets differ in length or are
/// empty; [`FitError::UnsupportedConfiguration`] if the requested component
/// combination is not implemented; [`FitError::ToleranceExceeded`] if a
/// tolerance is set and any per-point residual of the solution exceeds it.
pub fn fit_matched_points(
    src_pts: &[[f64; 3]],
    tgt_pts: &[[f64; 3]],
    opts: &MatchedFitOptions,
) -> Result<FitSolution, FitError> {
    if src_pts.len() != tgt_pts.len() || src_pts.is_empty() {
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

    let residual = |x: &[f64]| {
        let trans = info.matrix_unchecked(x);
        let mut est = vec![[0.0; 3]; src_pts.len()];
        transform_points3d(src_pts, &trans, &mut est);
        let mut out = Vec::with_capacity(est.len() * 3);
        for (e, t) in est.iter().zip(tgt_pts.iter()) {
            out.push(t[0] - e[0]);
            out.push(t[1] - e[1]);
            out.push(t[2] - e[2]);
        }
        out
    };

    let solved = least_squares(residual, &x0, &opts.solver)?;
    log::debug!(
        "matched-point fit: {} iterations, {:?}, cost {:.3e}",
        solved.iterations,
        solved.termination,
        solved.final_cost
    );

    let trans = info.matrix_unchecked(&solved.params);

    if let Some(tol) = opts.tolerance {
        let mut est = vec![[0.0; 3]; src_pts.len()];
        transform_points3d(src_pts, &trans, &mut est);
        let residuals: Vec<f64> = est
            .iter()
            .zip(tgt_pts.iter())
            .map(|(e, t)| euclidean_distance(e, t))
            .collect();
        let worst = residuals.iter().cloned().fold(0.0, f64::max);
        if worst > tol {
            return Err(FitError::ToleranceExceeded {
                tol,
                worst,
                residuals,
            });
        }
    }

    Ok(FitSolution::new(
        solved.params,
        info,
        trans,
        solved.iterations,
        solved.termination,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn random_points(num_points: usize) -> Vec<[f64; 3]> {
        (0..num_points)
            .map(|_| {
                [
                    rand::random::<f64>(),
                    rand::random::<f64>(),
                    rand::random::<f64>(),
                ]
            })
            .collect()
    }

    fn assert_matrices_eq(a: &[[f64; 4]; 4], b: &[[f64; 4]; 4], epsilon: f64) {
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_round_trip_all_supported_combinations() -> Result<(), FitError> {
        let src = random_points(30);

        for (rotate, translate, scale) in SUPPORTED {
            let info = ParamInfo {
                rotate,
                translate,
                scale,
            };
            let mut true_params = vec![0.12, -0.08, 0.15];
            if translate {
                true_params.extend([0.05, -0.1, 0.2]);
            }
            if scale == Scale::Uniform {
                true_params.push(1.1);
            }
            let true_trans = info.params_to_matrix(&true_params)?;

            let mut tgt = vec![[0.0; 3]; src.len()];
            transform_points3d(&src, &true_trans, &mut tgt);

            let opts = MatchedFitOptions {
                rotate,
                translate,
                scale,
                ..Default::default()
            };
            let solution = fit_matched_points(&src, &tgt, &opts)?;
            assert_matrices_eq(solution.matrix(), &true_trans, 1e-4);
        }
        Ok(())
    }

    #[test]
    fn test_rotate_only_collinear_pair_has_no_scale() -> Result<(), FitError> {
        let src = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let true_trans = ParamInfo {
            rotate: true,
            translate: false,
            scale: Scale::None,
        }
        .params_to_matrix(&[0.0, 0.0, 0.3])?;
        let mut tgt = vec![[0.0; 3]; src.len()];
        transform_points3d(&src, &true_trans, &mut tgt);

        let opts = MatchedFitOptions {
            translate: false,
            ..Default::default()
        };
        let solution = fit_matched_points(&src, &tgt, &opts)?;

        // three rotation angles, no scale component in the vector
        assert_eq!(solution.params().len(), 3);

        // and the fitted rotation block stays orthonormal
        let trans = solution.matrix();
        for i in 0..3 {
            let norm = (trans[i][0].powi(2) + trans[i][1].powi(2) + trans[i][2].powi(2)).sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_shape_mismatch() {
        let result = fit_matched_points(
            &random_points(4),
            &random_points(5),
            &MatchedFitOptions::default(),
        );
        assert!(matches!(
            result,
            Err(FitError::ShapeMismatch { src: 4, tgt: 5 })
        ));
    }

    #[test]
    fn test_unsupported_combination() {
        let opts = MatchedFitOptions {
            rotate: false,
            translate: true,
            scale: Scale::PerAxis,
            ..Default::default()
        };
        let points = random_points(10);
        assert!(matches!(
            fit_matched_points(&points, &points, &opts),
            Err(FitError::UnsupportedConfiguration {
                rotate: false,
                translate: true,
                scale: 3
            })
        ));
    }

    #[test]
    fn test_tolerance_gate() -> Result<(), FitError> {
        let src = random_points(10);
        let mut tgt = src.clone();
        tgt[0][0] += 1.0;
        tgt[0][1] += 1.0;

        // without a tolerance the outlier is absorbed into the best fit
        let solution = fit_matched_points(&src, &tgt, &MatchedFitOptions::default());
        assert!(solution.is_ok());

        // with one, it is a hard error carrying the residual vector
        let opts = MatchedFitOptions::default().with_tolerance(0.5);
        match fit_matched_points(&src, &tgt, &opts) {
            Err(FitError::ToleranceExceeded {
                tol,
                worst,
                residuals,
            }) => {
                assert_relative_eq!(tol, 0.5);
                assert!(worst > 0.5);
                assert_eq!(residuals.len(), src.len());
            }
            other => panic!("expected ToleranceExceeded, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_initial_guess_validated() {
        let points = random_points(5);
        let opts = MatchedFitOptions::default().with_initial_guess(vec![0.0; 4]);
        assert!(matches!(
            fit_matched_points(&points, &points, &opts),
            Err(FitError::ParamCount {
                expected: 6,
                actual: 4
            })
        ));
    }
}
