#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Anatomical coordinate-frame construction from fiducial landmarks.
pub mod frames;

/// Linear algebra utilities.
pub mod linalg;

/// Transform matrix constructors.
pub mod transforms;

/// Voxel-grid point decimation.
pub mod voxel_grid;
