//! Position, rotation and scale of a scene object
//!
//! A [`Transform`] owns its local TRS values and a lazily computed world
//! matrix. The world matrix lives in a `Cell` so it can be filled in while the
//! scene is only borrowed immutably (culling and picking read matrices during
//! traversal). All writes go through [`TransformMut`], which is obtained from
//! [`Scene::transform_mut`](crate::scene::Scene::transform_mut) and
//! invalidates the object's cached matrix and every cached matrix below it.

use std::cell::Cell;

use crate::foundation::math::{
    angle_axis, decompose_trs, normalized_rotation, rescale_if_overflowing, Mat4, Quat, RawQuat,
    Vec3,
};
use crate::scene::{Scene, SceneObjectId};

/// Local transform of a scene object with a cached world matrix
#[derive(Debug, Clone)]
pub struct Transform {
    pub(crate) position: Vec3,
    pub(crate) rotation: RawQuat,
    pub(crate) scale: Vec3,
    world_matrix: Cell<Option<Mat4>>,
    recompute_count: Cell<u64>,
}

impl Transform {
    /// Identity transform
    pub fn new() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: RawQuat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            world_matrix: Cell::new(None),
            recompute_count: Cell::new(0),
        }
    }

    /// Local position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation, normalised
    pub fn rotation(&self) -> Quat {
        normalized_rotation(&self.rotation)
    }

    /// Local rotation exactly as stored (may not have unit length)
    pub fn raw_rotation(&self) -> RawQuat {
        self.rotation
    }

    /// Local scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Rotation about Y in radians
    pub fn rotation_yaw(&self) -> f32 {
        let q = self.rotation().into_inner();
        (-2.0 * (q.i * q.k - q.w * q.j)).clamp(-1.0, 1.0).asin()
    }

    /// Rotation about X in radians
    pub fn rotation_pitch(&self) -> f32 {
        let q = self.rotation().into_inner();
        f32::atan2(
            2.0 * (q.j * q.k + q.w * q.i),
            q.w * q.w - q.i * q.i - q.j * q.j + q.k * q.k,
        )
    }

    /// Rotation about Z in radians
    pub fn rotation_roll(&self) -> f32 {
        let q = self.rotation().into_inner();
        f32::atan2(
            2.0 * (q.i * q.j + q.w * q.k),
            q.w * q.w + q.i * q.i - q.j * q.j - q.k * q.k,
        )
    }

    /// `T * R * S` built from the local values
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation().to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Cached world matrix, `None` when it must be recomputed
    pub fn cached_world_matrix(&self) -> Option<Mat4> {
        self.world_matrix.get()
    }

    /// Whether the cached world matrix is current
    pub fn is_world_matrix_valid(&self) -> bool {
        self.world_matrix.get().is_some()
    }

    /// How many times the world matrix has been recomputed
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count.get()
    }

    /// Drop the cached matrix; returns whether it was valid before
    pub(crate) fn invalidate(&self) -> bool {
        self.world_matrix.take().is_some()
    }

    pub(crate) fn store_world_matrix(&self, matrix: Mat4) {
        self.recompute_count.set(self.recompute_count.get() + 1);
        self.world_matrix.set(Some(matrix));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Write access to one object's transform
///
/// Every setter invalidates the object's world matrix and, if it was cached,
/// the world matrices of the whole subtree. Setters return `&mut Self` so
/// calls can be chained.
pub struct TransformMut<'a> {
    scene: &'a mut Scene,
    id: SceneObjectId,
}

impl<'a> TransformMut<'a> {
    pub(crate) fn new(scene: &'a mut Scene, id: SceneObjectId) -> Self {
        Self { scene, id }
    }

    fn modify(&mut self, rotation_changed: bool, f: impl FnOnce(&mut Transform)) -> &mut Self {
        if let Some(object) = self.scene.objects.get_mut(self.id) {
            f(&mut object.transform);
            if rotation_changed && rescale_if_overflowing(&mut object.transform.rotation) {
                log::trace!("rescaled overflowing rotation of {:?}", self.id);
            }
        }
        self.scene.invalidate_transform(self.id);
        self
    }

    /// Read the current values
    pub fn get(&self) -> Option<&Transform> {
        self.scene.objects.get(self.id).map(|object| &object.transform)
    }

    /// Set the local position
    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.modify(false, |t| t.position = position)
    }

    /// Set the local X coordinate
    pub fn set_position_x(&mut self, x: f32) -> &mut Self {
        self.modify(false, |t| t.position.x = x)
    }

    /// Set the local Y coordinate
    pub fn set_position_y(&mut self, y: f32) -> &mut Self {
        self.modify(false, |t| t.position.y = y)
    }

    /// Set the local Z coordinate
    pub fn set_position_z(&mut self, z: f32) -> &mut Self {
        self.modify(false, |t| t.position.z = z)
    }

    /// Move by `delta` in parent space
    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.modify(false, |t| t.position += delta)
    }

    /// Replace the rotation
    pub fn set_rotation(&mut self, rotation: RawQuat) -> &mut Self {
        self.modify(true, |t| t.rotation = rotation)
    }

    /// Replace the rotation with `angle` radians about `axis`
    pub fn set_rotation_by_axis(&mut self, angle: f32, axis: Vec3) -> &mut Self {
        self.modify(true, |t| t.rotation = angle_axis(angle, axis))
    }

    /// Pre-multiply the rotation by `rotation`
    pub fn rotate(&mut self, rotation: RawQuat) -> &mut Self {
        self.modify(true, |t| t.rotation = rotation * t.rotation)
    }

    /// Pre-multiply the rotation by `angle` radians about `axis`
    pub fn rotate_by_axis(&mut self, angle: f32, axis: Vec3) -> &mut Self {
        self.rotate(angle_axis(angle, axis))
    }

    /// Rotate about `pivot` (parent space): orientation and position both turn
    pub fn rotate_with_pivot(&mut self, rotation: RawQuat, pivot: Vec3) -> &mut Self {
        self.modify(true, |t| {
            t.rotation = rotation * t.rotation;
            let relative = t.position - pivot;
            t.position = normalized_rotation(&rotation) * relative + pivot;
        })
    }

    /// Rotate `angle` radians about `axis` through `pivot`
    pub fn rotate_by_axis_with_pivot(&mut self, angle: f32, axis: Vec3, pivot: Vec3) -> &mut Self {
        self.rotate_with_pivot(angle_axis(angle, axis), pivot)
    }

    /// Set the local scale
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.modify(false, |t| t.scale = scale)
    }

    /// Set the local X scale
    pub fn set_scale_x(&mut self, x: f32) -> &mut Self {
        self.modify(false, |t| t.scale.x = x)
    }

    /// Set the local Y scale
    pub fn set_scale_y(&mut self, y: f32) -> &mut Self {
        self.modify(false, |t| t.scale.y = y)
    }

    /// Set the local Z scale
    pub fn set_scale_z(&mut self, z: f32) -> &mut Self {
        self.modify(false, |t| t.scale.z = z)
    }

    /// Decompose `matrix` into position, rotation and scale
    ///
    /// The decomposition is stored as the local TRS. For an object with a
    /// parent the resulting world matrix is `parent_world * matrix`.
    pub fn set_world_matrix(&mut self, matrix: &Mat4) -> &mut Self {
        let trs = decompose_trs(matrix);
        self.modify(true, |t| {
            t.position = trs.translation;
            t.rotation = trs.rotation.into_inner();
            t.scale = trs.scale;
        })
    }

    /// Back to identity
    pub fn reset(&mut self) -> &mut Self {
        self.modify(true, |t| {
            t.position = Vec3::zeros();
            t.rotation = RawQuat::identity();
            t.scale = Vec3::new(1.0, 1.0, 1.0);
        })
    }
}
