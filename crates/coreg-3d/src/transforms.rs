/// The 4x4 identity transform.
pub fn identity() -> [[f64; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Compute a 3x3 rotation matrix from angles around the x, y and z axes.
///
/// The rotations are applied in that order: the combined matrix is
/// `Rz(rz) * Ry(ry) * Rx(rx)`.
///
/// # Arguments
///
/// * `rx` - Rotation angle around the x axis, in radians.
/// * `ry` - Rotation angle around the y axis, in radians.
/// * `rz` - Rotation angle around the z axis, in radians.
///
/// Example:
///
/// ```
/// use coreg_3d::transforms::rotation3d;
///
/// let rot = rotation3d(0.0, 0.0, 0.0);
/// assert_eq!(rot, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn rotation3d(rx: f64, ry: f64, rz: f64) -> [[f64; 3]; 3] {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();
    [
        [cy * cz, -cx * sz + sx * sy * cz, sx * sz + cx * sy * cz],
        [cy * sz, cx * cz + sx * sy * sz, -sx * cz + cx * sy * sz],
        [-sy, sx * cy, cx * cy],
    ]
}

/// Compute a 4x4 homogeneous rotation matrix from angles around the x, y and
/// z axes, applied in that order.
pub fn rotation(rx: f64, ry: f64, rz: f64) -> [[f64; 4]; 4] {
    let r = rotation3d(rx, ry, rz);
    [
        [r[0][0], r[0][1], r[0][2], 0.0],
        [r[1][0], r[1][1], r[1][2], 0.0],
        [r[2][0], r[2][1], r[2][2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Compute a 4x4 homogeneous translation matrix.
pub fn translation(tx: f64, ty: f64, tz: f64) -> [[f64; 4]; 4] {
    [
        [1.0, 0.0, 0.0, tx],
        [0.0, 1.0, 0.0, ty],
        [0.0, 0.0, 1.0, tz],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Compute a 4x4 homogeneous scaling matrix with a separate factor per axis.
pub fn scaling(sx: f64, sy: f64, sz: f64) -> [[f64; 4]; 4] {
    [
        [sx, 0.0, 0.0, 0.0],
        [0.0, sy, 0.0, 0.0],
        [0.0, 0.0, sz, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation3d_about_x() {
        // a quarter turn around x maps +y onto +z
        let rot = rotation3d(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
        let expected = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rot[i][j], expected[i][j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_rotation3d_orthonormal() {
        let rot = rotation3d(0.3, -0.7, 1.2);
        for i in 0..3 {
            let row = rot[i];
            let norm = (row[0] * row[0] + row[1] * row[1] + row[2] * row[2]).sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
            for j in (i + 1)..3 {
                let dot =
                    rot[i][0] * rot[j][0] + rot[i][1] * rot[j][1] + rot[i][2] * rot[j][2];
                assert_relative_eq!(dot, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_homogeneous_bottom_rows() {
        for trans in [
            rotation(0.1, 0.2, 0.3),
            translation(1.0, 2.0, 3.0),
            scaling(0.5, 1.5, 2.0),
            identity(),
        ] {
            assert_eq!(trans[3], [0.0, 0.0, 0.0, 1.0]);
        }
    }
}
