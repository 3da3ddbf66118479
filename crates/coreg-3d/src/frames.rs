use thiserror::Error;

use crate::linalg::{cross3, dot3, matmul44, norm3};
use crate::transforms::translation;

/// Error types for coordinate-frame construction.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A landmark was not provided as a length-3 coordinate vector.
    #[error("landmark `{name}` must have 3 coordinates, got {len}")]
    ShapeMismatch {
        /// Which landmark had the wrong shape.
        name: &'static str,
        /// The number of coordinates actually provided.
        len: usize,
    },

    /// The landmarks do not span a frame.
    #[error("degenerate landmark geometry: {0}")]
    DegenerateLandmarks(&'static str),
}

/// Landmark spans below this are treated as zero-length.
const SPAN_EPS: f64 = 1e-12;

fn landmark(name: &'static str, point: &[f64]) -> Result<[f64; 3], FrameError> {
    match point {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(FrameError::ShapeMismatch {
            name,
            len: point.len(),
        }),
    }
}

/// Construct the transform from an ambient coordinate system to the
/// anatomical head frame defined by three fiducial landmarks.
///
/// The head frame has its x axis through the two preauricular points
/// (pointing right), its origin at the projection of the nasion onto that
/// axis, its y axis from the origin toward the nasion, and its z axis as
/// the cross product of the two (pointing up). The returned matrix composes
/// the re-centering translation (applied first) with the basis rotation.
///
/// # Arguments
///
/// * `nasion` - Nasion coordinates, length 3.
/// * `lpa` - Left preauricular point coordinates, length 3.
/// * `rpa` - Right preauricular point coordinates, length 3.
///
/// # Returns
///
/// A 4x4 homogeneous transform mapping ambient coordinates to head
/// coordinates.
///
/// # Errors
///
/// [`FrameError::ShapeMismatch`] if any landmark is not of length 3;
/// [`FrameError::DegenerateLandmarks`] if the preauricular points coincide
/// or the nasion lies on the preauricular axis.
pub fn head_frame_transform(
    nasion: &[f64],
    lpa: &[f64],
    rpa: &[f64],
) -> Result<[[f64; 4]; 4], FrameError> {
    let nasion = landmark("nasion", nasion)?;
    let lpa = landmark("lpa", lpa)?;
    let rpa = landmark("rpa", rpa)?;

    let mut right = [rpa[0] - lpa[0], rpa[1] - lpa[1], rpa[2] - lpa[2]];
    let right_span = norm3(&right);
    if right_span < SPAN_EPS {
        return Err(FrameError::DegenerateLandmarks(
            "preauricular points coincide",
        ));
    }
    for val in right.iter_mut() {
        *val /= right_span;
    }

    // origin: nasion projected onto the preauricular axis
    let offset = [nasion[0] - lpa[0], nasion[1] - lpa[1], nasion[2] - lpa[2]];
    let along = dot3(&offset, &right);
    let origin = [
        lpa[0] + along * right[0],
        lpa[1] + along * right[1],
        lpa[2] + along * right[2],
    ];

    let mut anterior = [
        nasion[0] - origin[0],
        nasion[1] - origin[1],
        nasion[2] - origin[2],
    ];
    let anterior_span = norm3(&anterior);
    if anterior_span < SPAN_EPS {
        return Err(FrameError::DegenerateLandmarks(
            "nasion lies on the preauricular axis",
        ));
    }
    for val in anterior.iter_mut() {
        *val /= anterior_span;
    }

    let mut superior = [0.0; 3];
    cross3(&right, &anterior, &mut superior);

    let basis = [
        [right[0], right[1], right[2], 0.0],
        [anterior[0], anterior[1], anterior[2], 0.0],
        [superior[0], superior[1], superior[2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let recenter = translation(-origin[0], -origin[1], -origin[2]);

    let mut trans = [[0.0; 4]; 4];
    matmul44(&basis, &recenter, &mut trans);
    Ok(trans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::transform_points3d;
    use approx::assert_relative_eq;

    #[test]
    fn test_aligned_landmarks_yield_identity() {
        // landmarks already sit in head coordinates
        let trans = head_frame_transform(&[0.0, 1.0, 0.0], &[-1.0, 0.0, 0.0], &[1.0, 0.0, 0.0])
            .unwrap();
        let expected = crate::transforms::identity();
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(trans[i][j], expected[i][j], epsilon = 1e-12);
            }
        }

        let mut mapped = vec![[0.0; 3]];
        transform_points3d(&[[1.0, 0.0, 0.0]], &trans, &mut mapped);
        assert_relative_eq!(mapped[0][0], 1.0);
        assert_relative_eq!(mapped[0][1], 0.0);
        assert_relative_eq!(mapped[0][2], 0.0);
    }

    #[test]
    fn test_landmarks_map_to_frame_axes() {
        let nasion = [2.0, 3.0, 1.5];
        let lpa = [0.5, 1.0, 0.8];
        let rpa = [3.5, 1.2, 0.9];
        let trans = head_frame_transform(&nasion, &lpa, &rpa).unwrap();

        let mut mapped = vec![[0.0; 3]; 3];
        transform_points3d(&[nasion, lpa, rpa], &trans, &mut mapped);

        // nasion lands on the +y axis, preauricular points on the x axis
        assert_relative_eq!(mapped[0][0], 0.0, epsilon = 1e-12);
        assert!(mapped[0][1] > 0.0);
        assert_relative_eq!(mapped[0][2], 0.0, epsilon = 1e-12);
        for pa in &mapped[1..] {
            assert_relative_eq!(pa[1], 0.0, epsilon = 1e-12);
            assert_relative_eq!(pa[2], 0.0, epsilon = 1e-12);
        }
        assert!(mapped[1][0] < 0.0 && mapped[2][0] > 0.0);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let trans = head_frame_transform(&[0.2, 2.1, 0.3], &[-1.3, 0.1, -0.2], &[1.1, -0.1, 0.4])
            .unwrap();
        for i in 0..3 {
            let row = trans[i];
            let norm = (row[0] * row[0] + row[1] * row[1] + row[2] * row[2]).sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
            for j in (i + 1)..3 {
                let dot = trans[i][0] * trans[j][0]
                    + trans[i][1] * trans[j][1]
                    + trans[i][2] * trans[j][2];
                assert_relative_eq!(dot, 0.0, epsilon = 1e-12);
            }
        }
        assert_eq!(trans[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_short_landmark_rejected() {
        let result = head_frame_transform(&[0.0, 1.0], &[-1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(
            result,
            Err(FrameError::ShapeMismatch { name: "nasion", len: 2 })
        ));
    }

    #[test]
    fn test_collinear_landmarks_rejected() {
        let result = head_frame_transform(&[0.5, 0.0, 0.0], &[-1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(FrameError::DegenerateLandmarks(_))));

        let result = head_frame_transform(&[0.0, 1.0, 0.0], &[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(FrameError::DegenerateLandmarks(_))));
    }
}
