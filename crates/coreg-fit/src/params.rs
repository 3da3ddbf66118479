use coreg_3d::linalg::matmul44;
use coreg_3d::transforms::{identity, rotation, scaling, translation};

use crate::error::FitError;
use crate::solver::TerminationReason;

/// Number of scale parameters in a transform estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Points are not scaled.
    None,
    /// Points are scaled by the same factor along all axes.
    Uniform,
    /// Points are scaled by a separate factor along each axis.
    PerAxis,
}

impl Scale {
    /// Number of parameters this variant contributes to the vector.
    pub fn n_params(&self) -> usize {
        match self {
            Scale::None => 0,
            Scale::Uniform => 1,
            Scale::PerAxis => 3,
        }
    }
}

/// Descriptor of which transform components a parameter vector encodes.
///
/// The vector layout is fixed: rotation angles (x, y, z) first when rotation
/// is active, then the translation (x, y, z) when active, then the scale
/// factor(s). A parameter vector is meaningless without its descriptor, so
/// the two always travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    /// Whether the vector carries rotation angles.
    pub rotate: bool,
    /// Whether the vector carries a translation.
    pub translate: bool,
    /// Which scale parameters the vector carries.
    pub scale: Scale,
}

impl ParamInfo {
    /// Total number of parameters the descriptor requires.
    pub fn n_params(&self) -> usize {
        let mut n = 0;
        if self.rotate {
            n += 3;
        }
        if self.translate {
            n += 3;
        }
        n + self.scale.n_params()
    }

    /// The parameter vector of the identity transform: zero rotation and
    /// translation, unit scale.
    pub fn identity_params(&self) -> Vec<f64> {
        let mut params = vec![0.0; self.n_params()];
        let n_scale = self.scale.n_params();
        let offset = params.len() - n_scale;
        for val in params[offset..].iter_mut() {
            *val = 1.0;
        }
        params
    }

    /// Convert a parameter vector into a 4x4 homogeneous transform.
    ///
    /// The composed matrix is `scaling * translation * rotation`: applied to
    /// a point, rotation acts first, then translation, then scaling. Both
    /// fitters evaluate their residuals through this same composition, so a
    /// fitted parameter vector and the matrix built from it always agree.
    ///
    /// # Errors
    ///
    /// [`FitError::UnsupportedConfiguration`] if no component is active;
    /// [`FitError::ParamCount`] if the vector length disagrees with the
    /// descriptor.
    pub fn params_to_matrix(&self, params: &[f64]) -> Result<[[f64; 4]; 4], FitError> {
        if !self.rotate && !self.translate && self.scale == Scale::None {
            return Err(FitError::UnsupportedConfiguration {
                rotate: self.rotate,
                translate: self.translate,
                scale: self.scale.n_params(),
            });
        }
        if params.len() != self.n_params() {
            return Err(FitError::ParamCount {
                expected: self.n_params(),
                actual: params.len(),
            });
        }
        Ok(self.matrix_unchecked(params))
    }

    /// Like [`ParamInfo::params_to_matrix`], with the vector length already
    /// guaranteed by the caller.
    pub(crate) fn matrix_unchecked(&self, params: &[f64]) -> [[f64; 4]; 4] {
        let mut i = 0;
        let mut trans = identity();

        if self.rotate {
            trans = rotation(params[0], params[1], params[2]);
            i += 3;
        }

        if self.translate {
            let mut composed = [[0.0; 4]; 4];
            matmul44(
                &translation(params[i], params[i + 1], params[i + 2]),
                &trans,
                &mut composed,
            );
            trans = composed;
            i += 3;
        }

        match self.scale {
            Scale::None => {}
            Scale::Uniform => {
                let s = params[i];
                let mut composed = [[0.0; 4]; 4];
                matmul44(&scaling(s, s, s), &trans, &mut composed);
                trans = composed;
            }
            Scale::PerAxis => {
                let mut composed = [[0.0; 4]; 4];
                matmul44(
                    &scaling(params[i], params[i + 1], params[i + 2]),
                    &trans,
                    &mut composed,
                );
                trans = composed;
            }
        }

        trans
    }

    /// Resolve the starting parameters for a fit: the caller's initial guess
    /// when present (validated against the descriptor), the identity
    /// otherwise.
    pub(crate) fn starting_params(&self, guess: Option<&Vec<f64>>) -> Result<Vec<f64>, FitError> {
        match guess {
            Some(x0) => {
                if x0.len() != self.n_params() {
                    return Err(FitError::ParamCount {
                        expected: self.n_params(),
                        actual: x0.len(),
                    });
                }
                Ok(x0.clone())
            }
            None => Ok(self.identity_params()),
        }
    }
}

/// A fitted transform: the estimated parameter vector, its descriptor, and
/// the composed matrix, plus solver diagnostics.
#[derive(Debug, Clone)]
pub struct FitSolution {
    params: Vec<f64>,
    info: ParamInfo,
    trans: [[f64; 4]; 4],
    iterations: usize,
    termination: TerminationReason,
}

impl FitSolution {
    pub(crate) fn new(
        params: Vec<f64>,
        info: ParamInfo,
        trans: [[f64; 4]; 4],
        iterations: usize,
        termination: TerminationReason,
    ) -> Self {
        Self {
            params,
            info,
            trans,
            iterations,
            termination,
        }
    }

    /// The fitted parameter vector, laid out per [`FitSolution::param_info`].
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// The descriptor of the fitted parameter vector.
    pub fn param_info(&self) -> ParamInfo {
        self.info
    }

    /// The fitted transform as a 4x4 homogeneous matrix.
    pub fn matrix(&self) -> &[[f64; 4]; 4] {
        &self.trans
    }

    /// Number of solver iterations performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Why the solver stopped.
    pub fn termination(&self) -> TerminationReason {
        self.termination
    }
}
