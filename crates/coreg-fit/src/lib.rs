#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::FitError;

mod params;
pub use params::{FitSolution, ParamInfo, Scale};

mod knn;
pub use knn::NearestNeighborIndex;

mod solver;
pub use solver::{least_squares, SolverOptions, SolverResult, TerminationReason};

mod matched;
pub use matched::{fit_matched_points, MatchedFitOptions};

mod cloud;
pub use cloud::{fit_point_cloud, CloudFitOptions};
