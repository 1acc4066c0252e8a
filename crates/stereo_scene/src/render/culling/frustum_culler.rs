//! Per-eye frustum culling and render-list construction

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::render::culling::frustum::Frustum;
use crate::render::culling::occlusion_culler::OcclusionCuller;
use crate::render::gpu::GpuContext;
use crate::render::renderer::RenderStats;
use crate::render::shader::BoundingBoxShader;
use crate::scene::{RenderDataId, Scene, SceneObjectId};

/// Builds the render list of one eye
///
/// Candidates are objects with render data whose first pass has a material.
/// With frustum culling disabled every candidate is listed. Otherwise each
/// candidate's local bounding box is tested against the frustum extracted from
/// its own model-view-projection matrix, its eye distance is recorded for
/// sorting, the LOD band is applied, and occlusion queries are issued for the
/// survivors when occlusion culling is on.
#[derive(Debug, Clone, Copy)]
pub struct FrustumCuller {
    view: Mat4,
    view_projection: Mat4,
}

impl FrustumCuller {
    /// Culler for an eye's view and projection matrices
    pub fn new(view: &Mat4, projection: &Mat4) -> Self {
        Self {
            view: *view,
            view_projection: projection * view,
        }
    }

    /// Frustum in the local space of an object with world matrix `model`
    pub fn local_frustum(&self, model: &Mat4) -> Frustum {
        Frustum::from_matrix(&(self.view_projection * model))
    }

    /// Squared distance from the eye to a local-space point
    pub fn camera_distance_squared(&self, model: &Mat4, local_point: Vec3) -> f32 {
        (self.view * model)
            .transform_point(&Point3::from(local_point))
            .coords
            .magnitude_squared()
    }

    /// Cull `objects` and return the render data to draw, unsorted
    pub fn cull(
        &self,
        scene: &mut Scene,
        gpu: &mut dyn GpuContext,
        occlusion: &OcclusionCuller,
        proxy_shader: &BoundingBoxShader,
        objects: &[SceneObjectId],
        stats: &mut RenderStats,
    ) -> Vec<RenderDataId> {
        let mut render_list = Vec::new();
        let frustum_culling = scene.frustum_culling();
        let occlusion_culling = scene.occlusion_culling();

        for &id in objects {
            let Some(object) = scene.objects.get(id) else {
                continue;
            };
            let Some(rd_id) = object.render_data else {
                continue;
            };
            let Some(render_data) = scene.render_data.get(rd_id) else {
                continue;
            };
            if render_data.material().is_none() {
                continue;
            }
            stats.candidates += 1;

            if !frustum_culling {
                render_list.push(rd_id);
                continue;
            }

            let Some(mesh) = render_data.mesh() else {
                continue;
            };
            let (Some(aabb), Some(sphere)) = (mesh.bounding_box(), mesh.bounding_sphere()) else {
                continue;
            };

            let model = scene.world_matrix_of(object);
            let mvp = self.view_projection * model;
            let inside = Frustum::from_matrix(&mvp).contains_aabb(&aabb);

            if !inside {
                if let Some(object) = scene.objects.get_mut(id) {
                    object.in_frustum = false;
                }
                stats.frustum_culled += 1;
                continue;
            }

            let distance_squared = self.camera_distance_squared(&model, sphere.center);
            if let Some(render_data) = scene.render_data.get_mut(rd_id) {
                render_data.camera_distance_squared = distance_squared;
            }

            let Some(object) = scene.objects.get_mut(id) else {
                continue;
            };
            object.in_frustum = true;
            if !object.in_lod_range(distance_squared) {
                stats.lod_culled += 1;
                continue;
            }

            if !occlusion_culling || object.is_visible() {
                render_list.push(rd_id);
            } else {
                stats.occluded += 1;
            }

            if occlusion_culling && occlusion.issue_query(scene, gpu, proxy_shader, id, &mvp) {
                stats.queries_issued += 1;
            }
        }

        render_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessGpu;
    use crate::resources::{Material, Mesh, ShaderType};
    use crate::scene::RenderData;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn camera() -> (Mat4, Mat4) {
        let view = Mat4::identity();
        let projection = Mat4::new_perspective(1.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0);
        (view, projection)
    }

    fn add_cube(scene: &mut Scene, name: &str, position: Vec3) -> (SceneObjectId, RenderDataId) {
        let id = scene.create_child(scene.root(), name).unwrap();
        let rd = scene.create_render_data(RenderData::with_mesh_and_material(
            Arc::new(Mesh::cube()),
            Arc::new(Material::new(ShaderType::ExternalRenderer)),
        ));
        scene.attach_render_data(id, rd).unwrap();
        scene.transform_mut(id).unwrap().set_position(position);
        (id, rd)
    }

    fn run(scene: &mut Scene, gpu: &mut HeadlessGpu) -> (Vec<RenderDataId>, RenderStats) {
        let (view, projection) = camera();
        let objects = scene.flatten();
        let mut stats = RenderStats::default();
        let list = FrustumCuller::new(&view, &projection).cull(
            scene,
            gpu,
            &OcclusionCuller::new(),
            &BoundingBoxShader,
            &objects,
            &mut stats,
        );
        (list, stats)
    }

    #[test]
    fn test_disabled_frustum_lists_every_candidate() {
        let mut scene = Scene::default();
        let (_, front) = add_cube(&mut scene, "front", Vec3::new(0.0, 0.0, -5.0));
        let (_, behind) = add_cube(&mut scene, "behind", Vec3::new(0.0, 0.0, 5.0));
        scene.create_child(scene.root(), "empty").unwrap();

        let (list, stats) = run(&mut scene, &mut HeadlessGpu::new());
        assert_eq!(list, vec![front, behind]);
        assert_eq!(stats.candidates, 2);
    }

    #[test]
    fn test_objects_behind_camera_are_culled() {
        let mut scene = Scene::default();
        scene.set_frustum_culling(true);
        let (front_id, front) = add_cube(&mut scene, "front", Vec3::new(0.0, 0.0, -5.0));
        let (behind_id, _) = add_cube(&mut scene, "behind", Vec3::new(0.0, 0.0, 5.0));

        let (list, stats) = run(&mut scene, &mut HeadlessGpu::new());

        assert_eq!(list, vec![front]);
        assert_eq!(stats.frustum_culled, 1);
        assert!(scene.object(front_id).unwrap().in_frustum());
        assert!(!scene.object(behind_id).unwrap().in_frustum());
        assert_relative_eq!(scene.render_data(front).unwrap().camera_distance_squared(), 25.0, epsilon = 1e-4);
    }

    #[test]
    fn test_lod_band_rejects_but_marks_in_frustum() {
        let mut scene = Scene::default();
        scene.set_frustum_culling(true);
        let (id, _) = add_cube(&mut scene, "far", Vec3::new(0.0, 0.0, -20.0));
        scene.object_mut(id).unwrap().set_lod_range(0.0, 10.0);

        let (list, stats) = run(&mut scene, &mut HeadlessGpu::new());

        assert!(list.is_empty());
        assert_eq!(stats.lod_culled, 1);
        assert!(scene.object(id).unwrap().in_frustum());
    }

    #[test]
    fn test_occlusion_queries_only_for_survivors() {
        let mut scene = Scene::default();
        scene.set_frustum_culling(true);
        scene.set_occlusion_culling(true);
        let (front_id, _) = add_cube(&mut scene, "front", Vec3::new(0.0, 0.0, -5.0));
        let (behind_id, _) = add_cube(&mut scene, "behind", Vec3::new(0.0, 0.0, 5.0));
        let mut gpu = HeadlessGpu::new().with_query_latency(3);

        let (_, stats) = run(&mut scene, &mut gpu);

        assert_eq!(stats.queries_issued, 1);
        assert!(scene.object(front_id).unwrap().is_query_issued());
        assert!(!scene.object(behind_id).unwrap().is_query_issued());

        let (_, stats) = run(&mut scene, &mut gpu);
        assert_eq!(stats.queries_issued, 0);
    }
}
