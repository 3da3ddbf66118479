use faer::prelude::SpSolver;

use crate::error::FitError;

/// Steps below this norm are treated as zero.
const STEP_SIZE_TOLERANCE: f64 = 1e-14;

/// Options for the damped least-squares solver.
///
/// These are passed through unchanged from the fitter option structs, so a
/// caller can tune the iteration budget or the finite-difference step
/// without touching the fitting API.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum number of iterations (accepted or rejected steps).
    pub max_iterations: usize,
    /// Convergence threshold on the relative cost change of an accepted step.
    pub cost_tolerance: f64,
    /// Convergence threshold on the gradient norm.
    pub gradient_tolerance: f64,
    /// Initial damping factor (lambda).
    pub lambda_init: f64,
    /// Multiplicative factor for lambda adaptation.
    pub lambda_factor: f64,
    /// Damping ceiling; exceeding it terminates the solve.
    pub lambda_max: f64,
    /// Relative step for the finite-difference Jacobian.
    pub fd_step: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            cost_tolerance: 1e-10,
            gradient_tolerance: 1e-10,
            lambda_init: 1e-3,
            lambda_factor: 10.0,
            lambda_max: 1e10,
            fd_step: 1e-6,
        }
    }
}

impl SolverOptions {
    /// Create default solver options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the relative cost-change convergence threshold.
    pub fn with_cost_tolerance(mut self, tol: f64) -> Self {
        self.cost_tolerance = tol;
        self
    }

    /// Set the gradient-norm convergence threshold.
    pub fn with_gradient_tolerance(mut self, tol: f64) -> Self {
        self.gradient_tolerance = tol;
        self
    }

    /// Set the relative finite-difference step.
    pub fn with_fd_step(mut self, fd_step: f64) -> Self {
        self.fd_step = fd_step;
        self
    }
}

/// Why the solver stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Converged: relative cost change below tolerance.
    CostConverged,
    /// Converged: gradient norm below tolerance.
    GradientConverged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Damping exceeded its ceiling without finding a downhill step.
    LambdaMaxExceeded,
}

/// Result of a least-squares solve.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// The parameters at termination.
    pub params: Vec<f64>,
    /// Sum of squared residuals at termination.
    pub final_cost: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Why the solver stopped.
    pub termination: TerminationReason,
}

/// Minimize the sum of squared residuals over a parameter vector.
///
/// A Levenberg-Marquardt iteration: the Jacobian is estimated by central
/// differences, the damped normal equations `(J^T J + lambda I) delta = -J^T r`
/// are solved by partial-pivoting LU, and lambda is adapted by accepting
/// downhill steps and rejecting uphill ones.
///
/// # Arguments
///
/// * `residual` - Maps a parameter vector to the residual vector. Must
///   return the same number of residuals for every input.
/// * `x0` - Starting parameters.
/// * `opts` - Solver options.
///
/// # Errors
///
/// [`FitError::SolveFailed`] if the normal equations produce a non-finite
/// step (singular Jacobian). Running out of iterations is not an error: the
/// best parameters found are returned with the corresponding
/// [`TerminationReason`].
pub fn least_squares<F>(
    residual: F,
    x0: &[f64],
    opts: &SolverOptions,
) -> Result<SolverResult, FitError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = x0.len();
    let mut x = x0.to_vec();
    let mut r = residual(&x);
    let mut cost = r.iter().map(|v| v * v).sum::<f64>();

    let mut lambda = opts.lambda_init;
    let mut iterations = 0;

    loop {
        if iterations >= opts.max_iterations {
            return Ok(SolverResult {
                params: x,
                final_cost: cost,
                iterations,
                termination: TerminationReason::MaxIterations,
            });
        }

        // central-difference Jacobian, row-major (residual x parameter)
        let m = r.len();
        let mut jacobian = vec![0.0; m * n];
        let mut probe = x.clone();
        for j in 0..n {
            let h = opts.fd_step * x[j].abs().max(1.0);
            probe[j] = x[j] + h;
            let r_plus = residual(&probe);
            probe[j] = x[j] - h;
            let r_minus = residual(&probe);
            probe[j] = x[j];

            let inv_2h = 1.0 / (2.0 * h);
            for k in 0..m {
                jacobian[k * n + j] = (r_plus[k] - r_minus[k]) * inv_2h;
            }
        }

        // normal equations: J^T J and -J^T r
        let mut jtj = faer::Mat::<f64>::zeros(n, n);
        let mut rhs = faer::Mat::<f64>::zeros(n, 1);
        for k in 0..m {
            let row = &jacobian[k * n..(k + 1) * n];
            for i in 0..n {
                rhs.write(i, 0, rhs.read(i, 0) - row[i] * r[k]);
                for j in 0..n {
                    jtj.write(i, j, jtj.read(i, j) + row[i] * row[j]);
                }
            }
        }

        let gradient_norm = (0..n).map(|i| rhs.read(i, 0).powi(2)).sum::<f64>().sqrt();
        if gradient_norm < opts.gradient_tolerance {
            return Ok(SolverResult {
                params: x,
                final_cost: cost,
                iterations,
                termination: TerminationReason::GradientConverged,
            });
        }

        // damped system: (J^T J + lambda I) delta = -J^T r
        let mut damped = jtj.clone();
        for i in 0..n {
            damped.write(i, i, jtj.read(i, i) + lambda);
        }
        let delta = damped.as_ref().partial_piv_lu().solve(rhs.as_ref());
        if (0..n).any(|i| !delta.read(i, 0).is_finite()) {
            return Err(FitError::SolveFailed(
                "non-finite step from the damped normal equations",
            ));
        }

        let step_norm = (0..n).map(|i| delta.read(i, 0).powi(2)).sum::<f64>().sqrt();
        if step_norm < STEP_SIZE_TOLERANCE {
            return Ok(SolverResult {
                params: x,
                final_cost: cost,
                iterations,
                termination: TerminationReason::CostConverged,
            });
        }

        let x_new: Vec<f64> = (0..n).map(|i| x[i] + delta.read(i, 0)).collect();
        let r_new = residual(&x_new);
        let new_cost = r_new.iter().map(|v| v * v).sum::<f64>();
        iterations += 1;

        if new_cost < cost {
            let relative_change = if cost > 0.0 {
                (cost - new_cost) / cost
            } else {
                cost - new_cost
            };
            x = x_new;
            r = r_new;
            cost = new_cost;
            lambda = (lambda / opts.lambda_factor).max(1e-12);

            if relative_change < opts.cost_tolerance {
                return Ok(SolverResult {
                    params: x,
                    final_cost: cost,
                    iterations,
                    termination: TerminationReason::CostConverged,
                });
            }
        } else {
            lambda *= opts.lambda_factor;
            if lambda > opts.lambda_max {
                return Ok(SolverResult {
                    params: x,
                    final_cost: cost,
                    iterations,
                    termination: TerminationReason::LambdaMaxExceeded,
                });
            }
        }
    }
}
