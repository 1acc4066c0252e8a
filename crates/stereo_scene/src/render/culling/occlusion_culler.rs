//! Occlusion culling with asynchronous GPU queries
//!
//! Each object has at most one query in flight. A query is issued by drawing
//! the object's bounding box with colour writes off; its result is polled on
//! later frames without ever blocking, and fed into the object's
//! [`VisibilityFilter`](crate::scene::VisibilityFilter). Queries may stay
//! pending for several frames. There is no timeout: an object that stops being
//! traversed keeps its query unread.

use crate::foundation::math::Mat4;
use crate::render::gpu::{DrawCall, DrawGeometry, GpuContext, Program};
use crate::render::renderer::RenderStats;
use crate::render::shader::BoundingBoxShader;
use crate::scene::{OcclusionState, Scene, SceneObjectId};

/// Issues and polls occlusion queries
#[derive(Debug, Clone, Copy, Default)]
pub struct OcclusionCuller;

impl OcclusionCuller {
    /// Create an occlusion culler
    pub fn new() -> Self {
        Self
    }

    /// Read every available query result among `objects`
    ///
    /// Does nothing while occlusion culling is disabled on the scene. Only
    /// objects with render data and a first-pass material are considered.
    pub fn poll(
        &self,
        scene: &mut Scene,
        gpu: &mut dyn GpuContext,
        objects: &[SceneObjectId],
        stats: &mut RenderStats,
    ) {
        if !scene.occlusion_culling() {
            return;
        }

        for &id in objects {
            let drawable = scene
                .render_data_of(id)
                .is_some_and(|rd| rd.material().is_some());
            if !drawable {
                continue;
            }

            let Some(object) = scene.objects.get_mut(id) else {
                continue;
            };
            if object.occlusion != OcclusionState::QueryPending {
                continue;
            }
            let Some(query) = object.query else {
                object.occlusion = OcclusionState::NoQueryIssued;
                continue;
            };

            if let Some(samples) = gpu.poll_query(query) {
                let raw_visible = (samples & 1) == 1;
                object.record_visibility(raw_visible);
                object.occlusion = OcclusionState::NoQueryIssued;
                stats.query_results += 1;
                log::trace!(
                    "occlusion result for '{}': {} sample(s), visible = {}",
                    object.name(),
                    samples,
                    object.is_visible()
                );
            }
        }
    }

    /// Issue a query for `id` drawn with `mvp`, unless one is already pending
    ///
    /// A fresh bounding-box mesh is built for every query. Returns whether a
    /// query was issued.
    pub fn issue_query(
        &self,
        scene: &mut Scene,
        gpu: &mut dyn GpuContext,
        shader: &BoundingBoxShader,
        id: SceneObjectId,
        mvp: &Mat4,
    ) -> bool {
        let Some(object) = scene.objects.get(id) else {
            return false;
        };
        if object.is_query_issued() {
            return false;
        }
        let Some(proxy) = scene
            .render_data_of(id)
            .and_then(|rd| rd.mesh())
            .and_then(|mesh| mesh.bounding_box_mesh())
        else {
            return false;
        };
        let label = object.name().to_string();
        let (vertices, indices) = proxy.into_buffers();

        let Some(object) = scene.objects.get_mut(id) else {
            return false;
        };
        let query = *object.query.get_or_insert_with(|| gpu.create_query());
        object.occlusion = OcclusionState::QueryPending;

        gpu.set_depth_test(true);
        gpu.set_color_mask(false);
        gpu.begin_query(query);
        shader.render(
            gpu,
            DrawCall {
                program: Program::BoundingBox,
                geometry: DrawGeometry::Streamed { vertices, indices },
                mvp: *mvp,
                right_eye: false,
                label,
            },
        );
        gpu.end_query(query);
        gpu.set_color_mask(true);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{GpuCommand, HeadlessGpu};
    use crate::foundation::math::Vec3;
    use crate::resources::{GeometryHandle, Material, Mesh, ShaderType};
    use crate::scene::{Aabb, RenderData};
    use std::sync::Arc;

    fn scene_with_mesh(mesh: Mesh) -> (Scene, SceneObjectId) {
        let mut scene = Scene::default();
        scene.set_occlusion_culling(true);
        let id = scene.create_child(scene.root(), "cube").unwrap();
        let rd = scene.create_render_data(RenderData::with_mesh_and_material(
            Arc::new(mesh),
            Arc::new(Material::new(ShaderType::ExternalRenderer)),
        ));
        scene.attach_render_data(id, rd).unwrap();
        (scene, id)
    }

    fn scene_with_cube() -> (Scene, SceneObjectId) {
        scene_with_mesh(Mesh::cube())
    }

    #[test]
    fn test_at_most_one_query_in_flight() {
        let (mut scene, id) = scene_with_cube();
        let mut gpu = HeadlessGpu::new().with_query_latency(5);
        let culler = OcclusionCuller::new();
        let shader = BoundingBoxShader;

        assert!(culler.issue_query(&mut scene, &mut gpu, &shader, id, &Mat4::identity()));
        assert!(!culler.issue_query(&mut scene, &mut gpu, &shader, id, &Mat4::identity()));
        assert_eq!(gpu.outstanding_queries(), 1);
        assert!(scene.object(id).unwrap().is_query_issued());
    }

    #[test]
    fn test_query_draws_proxy_without_color_writes() {
        let (mut scene, id) = scene_with_cube();
        let mut gpu = HeadlessGpu::new();

        OcclusionCuller::new().issue_query(&mut scene, &mut gpu, &BoundingBoxShader, id, &Mat4::identity());

        let commands = gpu.take_commands();
        let mask_off = commands.iter().position(|c| *c == GpuCommand::ColorMask(false)).unwrap();
        let draw = commands
            .iter()
            .position(|c| matches!(c, GpuCommand::Draw(call) if call.program == Program::BoundingBox))
            .unwrap();
        let mask_on = commands.iter().position(|c| *c == GpuCommand::ColorMask(true)).unwrap();
        assert!(mask_off < draw && draw < mask_on);
        assert!(gpu.state().color_mask);
    }

    #[test]
    fn test_query_draws_bounding_box_not_source_mesh() {
        let sliver = Mesh::new(
            vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.1, 0.0), Vec3::new(0.0, 3.0, -1.0)],
            vec![0, 1, 2],
        )
        .with_geometry(GeometryHandle(42));
        let (mut scene, id) = scene_with_mesh(sliver);
        let mut gpu = HeadlessGpu::new();

        OcclusionCuller::new().issue_query(&mut scene, &mut gpu, &BoundingBoxShader, id, &Mat4::identity());

        let draw = gpu.draws().next().unwrap();
        let DrawGeometry::Streamed { vertices, indices } = &draw.geometry else {
            panic!("proxy drawn from uploaded geometry: {:?}", draw.geometry);
        };
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 36);
        assert_eq!(
            Aabb::from_points(vertices),
            Some(Aabb::new(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 3.0, 0.0)))
        );
    }

    #[test]
    fn test_poll_feeds_hysteresis_when_available() {
        let (mut scene, id) = scene_with_cube();
        let mut gpu = HeadlessGpu::new().with_query_latency(1).with_oracle(|_| 0);
        let culler = OcclusionCuller::new();
        let mut stats = RenderStats::default();

        culler.issue_query(&mut scene, &mut gpu, &BoundingBoxShader, id, &Mat4::identity());
        culler.poll(&mut scene, &mut gpu, &[id], &mut stats);
        assert!(scene.object(id).unwrap().is_query_issued());
        assert_eq!(stats.query_results, 0);

        culler.poll(&mut scene, &mut gpu, &[id], &mut stats);
        let object = scene.object(id).unwrap();
        assert!(!object.is_query_issued());
        assert_eq!(object.visibility().count(), -1);
        assert_eq!(stats.query_results, 1);
    }

    #[test]
    fn test_query_handle_is_reused() {
        let (mut scene, id) = scene_with_cube();
        let mut gpu = HeadlessGpu::new();
        let culler = OcclusionCuller::new();
        let mut stats = RenderStats::default();

        culler.issue_query(&mut scene, &mut gpu, &BoundingBoxShader, id, &Mat4::identity());
        let first = scene.object(id).unwrap().query_handle();
        culler.poll(&mut scene, &mut gpu, &[id], &mut stats);
        culler.issue_query(&mut scene, &mut gpu, &BoundingBoxShader, id, &Mat4::identity());

        assert_eq!(scene.object(id).unwrap().query_handle(), first);
    }
}
