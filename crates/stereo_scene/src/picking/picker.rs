//! Ray picking against scene objects
//!
//! Rays are brought into each object's local space with the inverse world
//! matrix, so meshes are never transformed vertex by vertex. Picking reads the
//! same cached world matrices as rendering and is independent of the render
//! path.

use crate::error::Result;
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::picking::eye_pointee::PointeeKind;
use crate::picking::ray::Ray;
use crate::scene::{Scene, SceneObjectId};

/// Space a hit point is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickSpace {
    /// World coordinates
    #[default]
    World,
    /// The picked object's local coordinates
    Local,
}

/// One object hit by a pick ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Object hit
    pub object: SceneObjectId,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// Hit point in the requested space
    pub hit: Vec3,
}

/// Scene picking entry points
pub struct Picker;

impl Picker {
    /// Intersect a world-space ray with one object's mesh
    ///
    /// `Ok(None)` when the object has no mesh, its world matrix is singular,
    /// or the ray misses. Unknown objects are an error.
    pub fn pick_object(
        scene: &Scene,
        object: SceneObjectId,
        ray: &Ray,
        kind: PointeeKind,
        space: PickSpace,
    ) -> Result<Option<PickResult>> {
        let world = scene.world_matrix(object)?;
        let Some(mesh) = scene.render_data_of(object).and_then(|rd| rd.mesh()) else {
            return Ok(None);
        };
        let Some(to_local) = world.try_inverse() else {
            return Ok(None);
        };
        let local_ray = ray.transformed(&to_local);

        let local_hit = match kind {
            PointeeKind::BoundingBox => mesh
                .bounding_box()
                .and_then(|aabb| local_ray.intersect_aabb(&aabb))
                .map(|(t0, _)| (t0, local_ray.at(t0))),
            PointeeKind::Mesh => local_ray.intersect_mesh(mesh),
        };

        Ok(local_hit.map(|(t, point)| PickResult {
            object,
            distance: t * ray.direction.magnitude(),
            hit: match space {
                PickSpace::World => world.transform_point(&Point3::from(point)).coords,
                PickSpace::Local => point,
            },
        }))
    }

    /// Every pickable object hit by `ray`, nearest first
    ///
    /// Only objects with an enabled [`EyePointeeHolder`](crate::picking::EyePointeeHolder)
    /// are tested, each against the geometry its holder selects.
    pub fn find_objects(scene: &Scene, ray: &Ray) -> Vec<PickResult> {
        let mut results: Vec<PickResult> = scene
            .flatten()
            .into_iter()
            .filter_map(|id| {
                let holder = scene.objects.get(id)?.eye_pointee_holder()?;
                if !holder.is_enabled() {
                    return None;
                }
                Self::pick_object(scene, id, ray, holder.kind(), PickSpace::World)
                    .ok()
                    .flatten()
            })
            .collect();
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }

    /// Objects hit by `ray`, nearest first, recording the hit on each holder
    ///
    /// Holders of objects that were tested but missed have their hit cleared.
    pub fn pick_scene(scene: &mut Scene, ray: &Ray) -> Vec<SceneObjectId> {
        let results = Self::find_objects(scene, ray);

        for object in scene.objects.values_mut() {
            if let Some(holder) = object.eye_pointee_holder_mut() {
                if holder.is_enabled() {
                    holder.set_hit(None);
                }
            }
        }
        for result in &results {
            if let Some(holder) = scene
                .objects
                .get_mut(result.object)
                .and_then(|object| object.eye_pointee_holder_mut())
            {
                holder.set_hit(Some(result.hit));
            }
        }

        log::trace!("picked {} object(s)", results.len());
        results.into_iter().map(|result| result.object).collect()
    }

    /// Distance along the camera's view direction to the object's mesh
    ///
    /// `view` is the camera's view matrix. Returns `f32::INFINITY` on a miss.
    pub fn pick_scene_object(scene: &Scene, object: SceneObjectId, view: &Mat4) -> Result<f32> {
        Ok(Self::pick_camera_ray(scene, object, view)?.map_or(f32::INFINITY, |result| result.distance))
    }

    /// World-space point where the camera's view direction hits the object's mesh
    pub fn pick_scene_object_point(scene: &Scene, object: SceneObjectId, view: &Mat4) -> Result<Option<Vec3>> {
        Ok(Self::pick_camera_ray(scene, object, view)?.map(|result| result.hit))
    }

    /// Whether the camera looks at the target's bounding box
    ///
    /// `center_view` is the view matrix of the centre eye.
    pub fn is_looking_at(scene: &Scene, target: SceneObjectId, center_view: &Mat4) -> Result<bool> {
        let Some(ray) = Ray::from_view(center_view) else {
            scene.object(target)?;
            return Ok(false);
        };
        Ok(Self::pick_object(scene, target, &ray, PointeeKind::BoundingBox, PickSpace::Local)?.is_some())
    }

    fn pick_camera_ray(scene: &Scene, object: SceneObjectId, view: &Mat4) -> Result<Option<PickResult>> {
        let Some(ray) = Ray::from_view(view) else {
            scene.object(object)?;
            return Ok(None);
        };
        Self::pick_object(scene, object, &ray, PointeeKind::Mesh, PickSpace::World)
    }
}
