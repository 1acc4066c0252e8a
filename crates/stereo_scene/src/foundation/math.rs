//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph, the culling
//! pipeline and the picker.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit, UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Raw (not necessarily unit) quaternion.
///
/// Transforms store their rotation in this form so repeated multiplication
/// can drift in magnitude; see [`rescale_if_overflowing`].
pub type RawQuat = Quaternion<f32>;

/// Component magnitude above which a stored quaternion is rescaled.
pub fn quaternion_overflow_threshold() -> f32 {
    f32::MAX.sqrt() / 2.0
}

/// Shrink `q` when any component exceeds [`quaternion_overflow_threshold`].
///
/// Returns `true` when the quaternion was rescaled. The direction of the
/// quaternion (and therefore the rotation it represents) is unchanged.
pub fn rescale_if_overflowing(q: &mut RawQuat) -> bool {
    let threshold = quaternion_overflow_threshold();
    if q.coords.iter().any(|c| c.abs() > threshold) {
        let scale_factor = 0.5 / f32::MAX.sqrt();
        q.coords *= scale_factor;
        true
    } else {
        false
    }
}

/// Normalised rotation for a raw quaternion, identity for a zero quaternion.
pub fn normalized_rotation(q: &RawQuat) -> Quat {
    Quat::try_new(*q, f32::EPSILON).unwrap_or_else(Quat::identity)
}

/// Rotation of `angle` radians about the axis `(x, y, z)`.
///
/// A zero-length axis yields the identity rotation.
pub fn angle_axis(angle: f32, axis: Vec3) -> RawQuat {
    Unit::try_new(axis, f32::EPSILON)
        .map_or_else(RawQuat::identity, |axis| {
            Quat::from_axis_angle(&axis, angle).into_inner()
        })
}

/// Translation, rotation and scale recovered from an affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    /// Translation (last column)
    pub translation: Vec3,
    /// Rotation with scale divided out
    pub rotation: Quat,
    /// Per-axis scale, negative on X when the basis is reflected
    pub scale: Vec3,
}

/// Decompose an affine `T * R * S` matrix.
///
/// Scale is the length of each basis column. A reflected basis
/// (negative determinant) cannot be told apart from a rotation by column
/// lengths alone, so the sign is folded into the X scale.
pub fn decompose_trs(matrix: &Mat4) -> Trs {
    let translation = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

    let basis: Mat3 = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let mut scale = Vec3::new(
        basis.column(0).magnitude(),
        basis.column(1).magnitude(),
        basis.column(2).magnitude(),
    );
    if basis.determinant() < 0.0 {
        scale.x = -scale.x;
    }

    let rotation_matrix = Mat3::from_columns(&[
        basis.column(0) / scale.x,
        basis.column(1) / scale.y,
        basis.column(2) / scale.z,
    ]);
    let rotation = Quat::from_matrix(&rotation_matrix);

    Trs {
        translation,
        rotation,
        scale,
    }
}

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rescale_keeps_direction() {
        let big = f32::MAX.sqrt();
        let mut q = RawQuat::new(big, 0.0, big * 0.5, 0.0);
        // Squared norm of `q` itself overflows
        let before = RawQuat::new(1.0, 0.0, 0.5, 0.0).normalize();

        assert!(rescale_if_overflowing(&mut q));
        assert!(q.coords.iter().all(|c| c.abs() <= quaternion_overflow_threshold()));
        assert_relative_eq!(q.normalize().coords, before.coords, epsilon = 1e-5);
    }

    #[test]
    fn test_rescale_ignores_normal_quaternions() {
        let mut q = RawQuat::new(0.5, 0.5, 0.5, 0.5);
        assert!(!rescale_if_overflowing(&mut q));
        assert_eq!(q, RawQuat::new(0.5, 0.5, 0.5, 0.5));
    }

    #[test]
    fn test_angle_axis_zero_axis_is_identity() {
        let q = angle_axis(1.0, Vec3::zeros());
        assert_eq!(q, RawQuat::identity());
    }

    #[test]
    fn test_decompose_roundtrip() {
        let rotation = Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.7);
        let matrix = Mat4::new_translation(&Vec3::new(1.0, -2.0, 3.0))
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 0.5, 3.0));

        let trs = decompose_trs(&matrix);

        assert_relative_eq!(trs.translation, Vec3::new(1.0, -2.0, 3.0), epsilon = 1e-5);
        assert_relative_eq!(trs.scale, Vec3::new(2.0, 0.5, 3.0), epsilon = 1e-5);
        assert!(trs.rotation.coords.dot(&rotation.coords).abs() > 0.999);
    }

    #[test]
    fn test_decompose_reflection() {
        let matrix = Mat4::new_nonuniform_scaling(&Vec3::new(-2.0, 1.0, 1.0));
        let trs = decompose_trs(&matrix);

        assert_relative_eq!(trs.scale, Vec3::new(-2.0, 1.0, 1.0), epsilon = 1e-5);
        assert!(trs.rotation.angle() < 1e-4);
    }
}
