//! Rays and ray intersection primitives

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::resources::Mesh;
use crate::scene::Aabb;

/// Tolerance for degenerate triangles and self-hits
pub const EPSILON: f32 = 0.000_01;

/// Half-line `origin + t * direction`, `t >= 0`
///
/// The direction is not required to be normalized. Transforming a ray by an
/// affine matrix keeps its parameter `t` meaningful, so a hit found in an
/// object's local space has the same `t` as in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from the origin down the negative Z axis
    pub fn forward() -> Self {
        Self::new(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0))
    }

    /// World-space ray looking out of a camera with view matrix `view`
    ///
    /// `None` when the view matrix is singular.
    pub fn from_view(view: &Mat4) -> Option<Self> {
        view.try_inverse().map(|camera| Self::forward().transformed(&camera))
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray mapped through an affine matrix
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point(&Point3::from(self.origin)).coords,
            direction: matrix.transform_vector(&self.direction),
        }
    }

    /// Slab test; entry and exit parameters when the box is hit ahead of the origin
    ///
    /// A box that contains the origin is not hit.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t0 = f32::NEG_INFINITY;
        let mut t1 = f32::INFINITY;

        for axis in 0..3 {
            let inv = 1.0 / self.direction[axis];
            let mut near = (aabb.min[axis] - self.origin[axis]) * inv;
            let mut far = (aabb.max[axis] - self.origin[axis]) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
        }

        (t0 <= t1 && t0 > 0.0).then_some((t0, t1))
    }

    /// Möller-Trumbore; returns `(t, u, v)` for a hit with `t > EPSILON`
    pub fn intersect_triangle(&self, triangle: &[Vec3; 3]) -> Option<(f32, f32, f32)> {
        let [v0, v1, v2] = *triangle;
        let e1 = v1 - v0;
        let e2 = v2 - v0;

        let p = self.direction.cross(&e2);
        let det = e1.dot(&p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - v0;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&e1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(&q) * inv_det;
        (t > EPSILON).then_some((t, u, v))
    }

    /// Nearest triangle hit on `mesh`: parameter and interpolated point
    pub fn intersect_mesh(&self, mesh: &Mesh) -> Option<(f32, Vec3)> {
        let mut nearest: Option<(f32, Vec3)> = None;
        for triangle in mesh.triangles() {
            let Some((t, u, v)) = self.intersect_triangle(&triangle) else {
                continue;
            };
            if nearest.map_or(true, |(best, _)| t < best) {
                let point = triangle[0] * (1.0 - u - v) + triangle[1] * u + triangle[2] * v;
                nearest = Some((t, point));
            }
        }
        nearest
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::forward()
    }
}
