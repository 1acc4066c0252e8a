//! Render pipeline integration tests
//!
//! Frames are rendered on the headless GPU. The occlusion oracle decides how
//! many samples each proxy draw passes, standing in for real depth testing.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::{RendererConfig, SceneConfig};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::backends::{GpuState, HeadlessGpu};
use crate::render::{DrawGeometry, Program, RenderStats, Renderer};
use crate::resources::{GeometryHandle, Material, Mesh, ShaderType, TextureHandle};
use crate::scene::{Aabb, RenderData, RenderingOrder, Scene, SceneObjectId};

fn projection() -> Mat4 {
    Mat4::new_perspective(1.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0)
}

fn textured() -> Arc<Material> {
    Arc::new(Material::new(ShaderType::Texture).with_texture("main_texture", TextureHandle(7)))
}

fn add_cube(scene: &mut Scene, name: &str, position: Vec3, material: Arc<Material>) -> SceneObjectId {
    let id = scene.create_child(scene.root(), name).unwrap();
    let rd = scene.create_render_data(RenderData::with_mesh_and_material(Arc::new(Mesh::cube()), material));
    scene.attach_render_data(id, rd).unwrap();
    scene.transform_mut(id).unwrap().set_position(position);
    id
}

fn material_draws(gpu: &mut HeadlessGpu) -> Vec<String> {
    let labels = gpu
        .draws()
        .filter(|call| matches!(call.program, Program::Material(_)))
        .map(|call| call.label.clone())
        .collect();
    gpu.take_commands();
    labels
}

fn frame(renderer: &mut Renderer, scene: &mut Scene, gpu: &mut HeadlessGpu) -> RenderStats {
    renderer.render_eye_view(scene, gpu, &Mat4::identity(), &projection(), 0)
}

/// Scene with one cube in front of the camera and both culling stages on;
/// the returned cell holds the sample count every occlusion query reports
fn occlusion_setup() -> (Scene, SceneObjectId, HeadlessGpu, Rc<Cell<u32>>) {
    let mut scene = Scene::new(
        SceneConfig::new()
            .with_frustum_culling(true)
            .with_occlusion_culling(true),
    );
    let id = add_cube(&mut scene, "cube", Vec3::new(0.0, 0.0, -5.0), textured());
    let samples = Rc::new(Cell::new(1));
    let oracle_samples = Rc::clone(&samples);
    let gpu = HeadlessGpu::new().with_oracle(move |_| oracle_samples.get());
    (scene, id, gpu, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_occluded_result_does_not_hide() {
        let (mut scene, id, mut gpu, samples) = occlusion_setup();
        let mut renderer = Renderer::default();

        for i in 0..21 {
            samples.set(u32::from(i != 10));
            frame(&mut renderer, &mut scene, &mut gpu);
            assert_eq!(material_draws(&mut gpu), vec!["cube".to_string()], "frame {i}");
        }
        assert!(scene.object(id).unwrap().is_visible());
    }

    #[test]
    fn test_thirteen_occluded_results_hide_then_recover() {
        let (mut scene, id, mut gpu, samples) = occlusion_setup();
        let mut renderer = Renderer::default();
        samples.set(0);

        // The first frame only issues a query; each later frame reads one result
        for _ in 0..13 {
            frame(&mut renderer, &mut scene, &mut gpu);
            assert_eq!(material_draws(&mut gpu).len(), 1);
        }
        let stats = frame(&mut renderer, &mut scene, &mut gpu);
        assert!(!scene.object(id).unwrap().is_visible());
        assert!(material_draws(&mut gpu).is_empty());
        assert_eq!(stats.occluded, 1);

        // Hidden objects keep being queried, so they can come back. The query
        // issued in the hiding frame still reports zero samples.
        samples.set(1);
        for _ in 0..15 {
            frame(&mut renderer, &mut scene, &mut gpu);
        }
        assert!(scene.object(id).unwrap().is_visible());
        assert_eq!(material_draws(&mut gpu).len(), 1);
    }

    #[test]
    fn test_occlusion_proxy_carries_bounding_box() {
        let mut scene = Scene::new(
            SceneConfig::new()
                .with_frustum_culling(true)
                .with_occlusion_culling(true),
        );
        let id = scene.create_child(scene.root(), "sliver").unwrap();
        let sliver = Mesh::new(
            vec![Vec3::new(-1.0, -0.5, 0.0), Vec3::new(1.0, -0.5, 0.0), Vec3::new(0.0, 0.5, -0.2)],
            vec![0, 1, 2],
        )
        .with_geometry(GeometryHandle(42));
        let rd = scene.create_render_data(RenderData::with_mesh_and_material(Arc::new(sliver), textured()));
        scene.attach_render_data(id, rd).unwrap();
        scene.transform_mut(id).unwrap().set_position_z(-5.0);
        // Only streamed box triangles count as visible samples
        let mut gpu = HeadlessGpu::new()
            .with_oracle(|call| u32::from(matches!(call.geometry, DrawGeometry::Streamed { .. })));
        let mut renderer = Renderer::default();

        let stats = frame(&mut renderer, &mut scene, &mut gpu);
        assert_eq!(stats.queries_issued, 1);

        let proxy = gpu.draws().find(|call| call.program == Program::BoundingBox).unwrap();
        let DrawGeometry::Streamed { vertices, .. } = &proxy.geometry else {
            panic!("proxy drawn from {:?}", proxy.geometry);
        };
        assert_eq!(
            Aabb::from_points(vertices),
            Some(Aabb::new(Vec3::new(-1.0, -0.5, -0.2), Vec3::new(1.0, 0.5, 0.0)))
        );
        let mesh_draw = gpu
            .draws()
            .find(|call| call.label == "sliver" && call.program != Program::BoundingBox)
            .unwrap();
        assert_eq!(mesh_draw.geometry, DrawGeometry::Uploaded(GeometryHandle(42)));

        gpu.take_commands();
        let stats = frame(&mut renderer, &mut scene, &mut gpu);
        assert_eq!(stats.query_results, 1);
        assert_eq!(scene.object(id).unwrap().visibility().count(), 1);
    }

    #[test]
    fn test_query_spanning_frames_is_not_reissued() {
        let (mut scene, id, gpu, _samples) = occlusion_setup();
        let mut gpu = gpu.with_query_latency(3);
        let mut renderer = Renderer::default();

        let issued: usize = (0..4)
            .map(|_| frame(&mut renderer, &mut scene, &mut gpu).queries_issued)
            .sum();

        assert_eq!(issued, 1);
        assert!(scene.object(id).unwrap().is_query_issued());
        assert_eq!(gpu.outstanding_queries(), 1);
    }

    #[test]
    fn test_transparent_objects_draw_far_to_near() {
        let mut scene = Scene::new(SceneConfig::new().with_frustum_culling(true));
        for (name, z) in [("near", -3.0), ("far", -9.0), ("middle", -6.0)] {
            let id = add_cube(&mut scene, name, Vec3::new(0.0, 0.0, z), textured());
            let rd = scene.object(id).unwrap().render_data().unwrap();
            scene
                .render_data_mut(rd)
                .unwrap()
                .set_rendering_order(RenderingOrder::TRANSPARENT);
        }
        add_cube(&mut scene, "opaque", Vec3::new(0.0, 0.0, -20.0), textured());
        add_cube(&mut scene, "behind", Vec3::new(0.0, 0.0, 5.0), textured());

        let mut gpu = HeadlessGpu::new();
        let stats = frame(&mut Renderer::default(), &mut scene, &mut gpu);

        assert_eq!(material_draws(&mut gpu), vec!["opaque", "far", "middle", "near"]);
        assert_eq!(stats.frustum_culled, 1);
    }

    #[test]
    fn test_dispatch_failure_is_contained() {
        let mut scene = Scene::default();
        let broken = Arc::new(Material::new(ShaderType::Texture));
        add_cube(&mut scene, "broken", Vec3::new(0.0, 0.0, -5.0), broken);
        add_cube(&mut scene, "after", Vec3::new(0.0, 0.0, -6.0), textured());

        let mut gpu = HeadlessGpu::new();
        let stats = frame(&mut Renderer::default(), &mut scene, &mut gpu);

        let programs: Vec<(String, Program)> = gpu.draws().map(|c| (c.label.clone(), c.program)).collect();
        assert_eq!(
            programs,
            vec![
                ("broken".to_string(), Program::Error),
                ("after".to_string(), Program::Material(ShaderType::Texture)),
            ]
        );
        assert_eq!(stats.dispatch_failures, 1);
        assert_eq!(gpu.state(), GpuState::default());
    }

    #[test]
    fn test_unregistered_custom_shader_falls_back() {
        let mut scene = Scene::default();
        add_cube(
            &mut scene,
            "custom",
            Vec3::new(0.0, 0.0, -5.0),
            Arc::new(Material::new(ShaderType::Custom(42))),
        );

        let mut gpu = HeadlessGpu::new();
        let stats = frame(&mut Renderer::new(RendererConfig::default()), &mut scene, &mut gpu);

        assert_eq!(stats.dispatch_failures, 1);
        assert_eq!(gpu.draws().next().map(|c| c.program), Some(Program::Error));
    }

    #[test]
    fn test_stereo_frame_draws_both_eyes() {
        let mut scene = Scene::default();
        add_cube(&mut scene, "cube", Vec3::new(0.0, 0.0, -5.0), textured());
        let left = Mat4::new_translation(&Vec3::new(0.03, 0.0, 0.0));
        let right = Mat4::new_translation(&Vec3::new(-0.03, 0.0, 0.0));

        let mut gpu = HeadlessGpu::new();
        let stats = Renderer::default().render_stereo(&mut scene, &mut gpu, [&left, &right], &projection());

        assert_eq!(stats[0].eye_index, 0);
        assert_eq!(stats[1].eye_index, 1);
        let eyes: Vec<bool> = gpu.draws().map(|c| c.right_eye).collect();
        assert_eq!(eyes, vec![false, true]);
    }
}
