//! Per-eye renderer
//!
//! One call to [`Renderer::render_eye_view`] draws the scene for one eye:
//!
//! 1. poll pending occlusion queries
//! 2. frustum cull, apply LOD bands and issue new occlusion queries
//! 3. sort the surviving render data
//! 4. reset the GPU state, clear, and dispatch each render data's passes
//!
//! A failing shader never aborts the frame. The failure is logged with the
//! object's name and the error shader is drawn in its place.

use crate::config::RendererConfig;
use crate::foundation::math::Mat4;
use crate::render::culling::{FrustumCuller, OcclusionCuller};
use crate::render::gpu::GpuContext;
use crate::render::shader::{DrawContext, ShaderManager};
use crate::render::sort::sort_render_list;
use crate::scene::{CullFace, RenderData, RenderMask, Scene};

/// Counters for one eye view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Eye the view was drawn for
    pub eye_index: usize,

    /// Objects with render data and a material
    pub candidates: usize,

    /// Candidates rejected by the frustum test
    pub frustum_culled: usize,

    /// Candidates outside their LOD band
    pub lod_culled: usize,

    /// Candidates hidden by occlusion culling
    pub occluded: usize,

    /// Occlusion queries issued this view
    pub queries_issued: usize,

    /// Occlusion results read this view
    pub query_results: usize,

    /// Length of the sorted render list
    pub render_list: usize,

    /// Render data actually dispatched
    pub objects_drawn: usize,

    /// Passes drawn by their own shader
    pub draw_calls: usize,

    /// Passes that fell back to the error shader
    pub dispatch_failures: usize,
}

impl RenderStats {
    /// Candidates that made it into the render list, as a fraction
    pub fn survival_ratio(&self) -> f32 {
        if self.candidates == 0 {
            0.0
        } else {
            self.render_list as f32 / self.candidates as f32
        }
    }
}

/// Draws scenes through a [`GpuContext`]
pub struct Renderer {
    config: RendererConfig,
    shaders: ShaderManager,
    occlusion: OcclusionCuller,
}

impl Renderer {
    /// Create a renderer with every built-in shader registered
    pub fn new(config: RendererConfig) -> Self {
        log::debug!("Creating Renderer...");
        Self {
            config,
            shaders: ShaderManager::new(),
            occlusion: OcclusionCuller::new(),
        }
    }

    /// Renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Shader registry
    pub fn shader_manager(&self) -> &ShaderManager {
        &self.shaders
    }

    /// Shader registry, for registering application shaders
    pub fn shader_manager_mut(&mut self) -> &mut ShaderManager {
        &mut self.shaders
    }

    /// Draw the scene for one eye
    ///
    /// `eye_index` 0 is the left eye; any other value is the right eye.
    pub fn render_eye_view(
        &mut self,
        scene: &mut Scene,
        gpu: &mut dyn GpuContext,
        view: &Mat4,
        projection: &Mat4,
        eye_index: usize,
    ) -> RenderStats {
        let mut stats = RenderStats {
            eye_index,
            ..RenderStats::default()
        };
        let objects = scene.flatten();

        self.occlusion.poll(scene, gpu, &objects, &mut stats);

        let culler = FrustumCuller::new(view, projection);
        let render_ids = culler.cull(
            scene,
            gpu,
            &self.occlusion,
            self.shaders.bounding_box_shader(),
            &objects,
            &mut stats,
        );

        let scene: &Scene = scene;
        let mut render_list: Vec<&RenderData> = render_ids
            .iter()
            .filter_map(|&id| scene.render_data.get(id))
            .collect();
        sort_render_list(&mut render_list, scene.frustum_culling());
        stats.render_list = render_list.len();

        reset_state(gpu);
        gpu.clear(self.config.clear_color);

        let mask = RenderMask::for_eye(eye_index);
        for render_data in render_list {
            self.render_render_data(scene, gpu, render_data, view, projection, mask, &mut stats);
        }

        log::debug!(
            "eye {}: {} candidates, {} frustum culled, {} lod culled, {} occluded, {} drawn, {} failures",
            eye_index,
            stats.candidates,
            stats.frustum_culled,
            stats.lod_culled,
            stats.occluded,
            stats.objects_drawn,
            stats.dispatch_failures
        );
        stats
    }

    /// Draw both eyes, left first
    pub fn render_stereo(
        &mut self,
        scene: &mut Scene,
        gpu: &mut dyn GpuContext,
        views: [&Mat4; 2],
        projection: &Mat4,
    ) -> [RenderStats; 2] {
        [
            self.render_eye_view(scene, gpu, views[0], projection, 0),
            self.render_eye_view(scene, gpu, views[1], projection, 1),
        ]
    }

    fn render_render_data(
        &mut self,
        scene: &Scene,
        gpu: &mut dyn GpuContext,
        render_data: &RenderData,
        view: &Mat4,
        projection: &Mat4,
        mask: RenderMask,
        stats: &mut RenderStats,
    ) {
        if !render_data.render_mask().intersects(mask) || !render_data.is_visible() {
            return;
        }
        let Some(owner) = render_data.owner().and_then(|id| scene.objects.get(id)) else {
            return;
        };

        if render_data.offset() {
            gpu.set_polygon_offset(Some((render_data.offset_factor(), render_data.offset_units())));
        }
        if !render_data.depth_test() {
            gpu.set_depth_test(false);
        }
        if !render_data.alpha_blend() {
            gpu.set_blend(false);
        }

        if render_data.mesh().is_some() {
            let model = scene.world_matrix_of(owner);
            let right_eye = mask.contains(RenderMask::RIGHT);

            for pass in render_data.passes() {
                let Some(material) = pass.material.as_deref() else {
                    continue;
                };
                gpu.set_cull_face(pass.cull_face);

                let context = DrawContext::new(
                    owner.name(),
                    render_data,
                    material,
                    model,
                    *view,
                    *projection,
                    right_eye,
                );
                let result = self
                    .shaders
                    .shader(material.shader_type())
                    .and_then(|shader| shader.render(gpu, &context));

                match result {
                    Ok(()) => stats.draw_calls += 1,
                    Err(e) => {
                        stats.dispatch_failures += 1;
                        if self.config.log_dispatch_failures {
                            log::error!("Error detected in render dispatch; name = '{}': {}", owner.name(), e);
                        }
                        self.shaders.error_shader().render(gpu, &context);
                    }
                }
            }
            stats.objects_drawn += 1;
        }

        reset_state(gpu);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

/// Default fixed-function state every object starts from
fn reset_state(gpu: &mut dyn GpuContext) {
    gpu.set_cull_face(CullFace::Back);
    gpu.set_polygon_offset(None);
    gpu.set_depth_test(true);
    gpu.set_blend(true);
}
