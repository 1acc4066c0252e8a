//! View frustum planes

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::Aabb;

/// Plane `a*x + b*y + c*z + d = 0`, positive side inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector `(a, b, c)`
    pub normal: Vec3,
    /// Offset `d`
    pub distance: f32,
}

impl Plane {
    /// Plane from raw coefficients, scaled so the normal has unit length
    ///
    /// A zero normal is not guarded against and yields NaN coefficients.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let length = coefficients.xyz().magnitude();
        Self {
            normal: coefficients.xyz() / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Six planes bounding the visible volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Right, left, bottom, top, far, near
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the planes of a clip matrix with the Gribb-Hartmann method
    ///
    /// With `matrix = projection * view * model` the planes are in the model's
    /// local space, so a mesh's local bounding box can be tested directly.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { matrix.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 - r2),
                Plane::from_coefficients(r3 + r2),
            ],
        }
    }

    /// Conservative box test
    ///
    /// The box is outside only when all eight corners are on the negative
    /// side (or on) a single plane. Boxes near a frustum edge can be reported
    /// inside although no part of them is visible.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        let corners = aabb.corners();
        self.planes.iter().all(|plane| {
            corners
                .iter()
                .any(|&corner| plane.distance_to_point(corner) > 0.0)
        })
    }
}
