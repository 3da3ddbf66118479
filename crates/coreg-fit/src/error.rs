use thiserror::Error;

/// Error types for transform fitting.
#[derive(Debug, Error)]
pub enum FitError {
    /// Input point sets have incompatible shapes.
    #[error("incompatible point set shapes: {src} source and {tgt} target points")]
    ShapeMismatch {
        /// Number of source points.
        src: usize,
        /// Number of target points.
        tgt: usize,
    },

    /// A parameter vector disagrees with its descriptor.
    #[error("parameter vector has {actual} values, the descriptor requires {expected}")]
    ParamCount {
        /// Number of parameters the descriptor requires.
        expected: usize,
        /// Number of parameters actually provided.
        actual: usize,
    },

    /// The requested component combination is not implemented.
    #[error(
        "unsupported parameter combination: rotate={rotate}, translate={translate}, scale={scale}"
    )]
    UnsupportedConfiguration {
        /// Whether rotation was requested.
        rotate: bool,
        /// Whether translation was requested.
        translate: bool,
        /// Number of scale parameters requested (0, 1 or 3).
        scale: usize,
    },

    /// The fitted transform leaves at least one matched point further from
    /// its target than the caller-supplied tolerance.
    #[error("fit error exceeds tolerance {tol}: worst residual {worst}")]
    ToleranceExceeded {
        /// The tolerance that was violated.
        tol: f64,
        /// The largest per-point residual.
        worst: f64,
        /// Per-point residual norms under the fitted transform.
        residuals: Vec<f64>,
    },

    /// The damped normal equations produced a non-finite step.
    #[error("least-squares solve failed: {0}")]
    SolveFailed(&'static str),
}
