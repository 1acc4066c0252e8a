//! Bounding volumes derived from mesh vertices
//!
//! Both volumes live in the mesh's local space. Culling tests them against
//! planes extracted from the full model-view-projection matrix, and picking
//! moves the ray into local space instead of moving the box out of it.

use crate::foundation::math::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing `points`, `None` when there are none
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.inf(p), max.sup(p)));
        Some(Self { min, max })
    }

    /// Box as `[min_x, min_y, min_z, max_x, max_y, max_z]`
    pub fn to_array(&self) -> [f32; 6] {
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners, X varying fastest
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Strict overlap test; boxes that only touch do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x && self.min.x < other.max.x &&
        self.max.y > other.min.y && self.min.y < other.max.y &&
        self.max.z > other.min.z && self.min.z < other.max.z
    }

    /// Axis-aligned box enclosing this box after an affine transform
    ///
    /// Graphics Gems "Transforming Axis-Aligned Bounding Boxes": start from
    /// the translation and add the smaller/larger product of every matrix
    /// element with the source interval.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let mut min = Vec3::new(matrix.m14, matrix.m24, matrix.m34);
        let mut max = min;

        for row in 0..3 {
            for col in 0..3 {
                let a = matrix[(row, col)] * self.min[col];
                let b = matrix[(row, col)] * self.max[col];
                min[row] += a.min(b);
                max[row] += a.max(b);
            }
        }

        Aabb { min, max }
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere centred on the box of `points`, reaching the farthest point
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let center = Aabb::from_points(points)?.center();
        let radius_squared = points
            .iter()
            .map(|p| (p - center).magnitude_squared())
            .fold(0.0_f32, f32::max);
        Some(Self {
            center,
            radius: radius_squared.sqrt(),
        })
    }

    /// Sphere as `[cx, cy, cz, r]`
    pub fn to_array(&self) -> [f32; 4] {
        [self.center.x, self.center.y, self.center.z, self.radius]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_from_points() {
        let points = [
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, -4.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();

        assert_eq!(aabb.to_array(), [-1.0, -2.0, -4.0, 1.0, 3.0, 0.5]);
        assert!(Aabb::from_points(&[] as &[Vec3]).is_none());
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_overlap_is_strict() {
        let a = Aabb::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let b = Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let touching = Aabb::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 2.0, 2.0));

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&touching));
    }

    #[test]
    fn test_aabb_transformed_by_rotation_and_translation() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let rotation = Mat4::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let matrix = Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0)) * rotation;

        let moved = aabb.transformed(&matrix);
        let half_diagonal = 2.0_f32.sqrt();

        assert_relative_eq!(moved.min, Vec3::new(10.0 - half_diagonal, -half_diagonal, -1.0), epsilon = 1e-5);
        assert_relative_eq!(moved.max, Vec3::new(10.0 + half_diagonal, half_diagonal, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_bounding_sphere_from_points() {
        let points = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)];
        let sphere = BoundingSphere::from_points(&points).unwrap();

        assert_relative_eq!(sphere.center, Vec3::new(1.0, 0.5, 0.0));
        assert_relative_eq!(sphere.radius, (4.0_f32 + 0.25).sqrt());
    }
}
