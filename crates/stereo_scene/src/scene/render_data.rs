//! How an object is drawn: mesh, passes, ordering and GPU state flags

use std::sync::Arc;

use bitflags::bitflags;

use crate::resources::{Material, Mesh};
use crate::scene::SceneObjectId;

/// Standard sort buckets, drawn in ascending order
pub struct RenderingOrder;

impl RenderingOrder {
    /// Sky boxes and other backdrops
    pub const BACKGROUND: i32 = 1000;
    /// Opaque geometry (default)
    pub const GEOMETRY: i32 = 2000;
    /// Alpha-blended geometry
    pub const TRANSPARENT: i32 = 3000;
    /// HUD and cursor
    pub const OVERLAY: i32 = 4000;
}

bitflags! {
    /// Eyes a render data is drawn for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderMask: u32 {
        /// Left eye (eye index 0)
        const LEFT = 1 << 0;
        /// Right eye (eye index 1)
        const RIGHT = 1 << 1;
    }
}

impl RenderMask {
    /// Mask bit for an eye index; index 0 is the left eye
    pub fn for_eye(eye_index: usize) -> Self {
        if eye_index == 0 {
            Self::LEFT
        } else {
            Self::RIGHT
        }
    }
}

impl Default for RenderMask {
    fn default() -> Self {
        Self::all()
    }
}

/// Face culling mode of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    /// Cull back faces (default GPU state)
    #[default]
    Back,
    /// Cull front faces
    Front,
    /// No face culling
    None,
}

/// One draw of a render data
#[derive(Debug, Clone, Default)]
pub struct RenderPass {
    /// Material the pass is drawn with; a pass without one is skipped
    pub material: Option<Arc<Material>>,
    /// Face culling mode for this pass
    pub cull_face: CullFace,
}

impl RenderPass {
    /// Pass drawing `material` with back-face culling
    pub fn new(material: Arc<Material>) -> Self {
        Self {
            material: Some(material),
            cull_face: CullFace::Back,
        }
    }

    /// Builder pattern: set the cull mode
    pub fn with_cull_face(mut self, cull_face: CullFace) -> Self {
        self.cull_face = cull_face;
        self
    }
}

/// Drawable part of a scene object
///
/// Always has at least one pass. Objects whose first pass has no material
/// are ignored by culling and never drawn.
#[derive(Debug, Clone)]
pub struct RenderData {
    mesh: Option<Arc<Mesh>>,
    passes: Vec<RenderPass>,
    rendering_order: i32,
    render_mask: RenderMask,
    visible: bool,
    offset: bool,
    offset_factor: f32,
    offset_units: f32,
    depth_test: bool,
    alpha_blend: bool,
    pub(crate) camera_distance_squared: f32,
    pub(crate) owner: Option<SceneObjectId>,
}

impl RenderData {
    /// Empty render data: no mesh, one pass without material
    pub fn new() -> Self {
        Self {
            mesh: None,
            passes: vec![RenderPass::default()],
            rendering_order: RenderingOrder::GEOMETRY,
            render_mask: RenderMask::all(),
            visible: true,
            offset: false,
            offset_factor: 0.0,
            offset_units: 0.0,
            depth_test: true,
            alpha_blend: true,
            camera_distance_squared: 0.0,
            owner: None,
        }
    }

    /// Render data drawing `mesh` with `material` in a single pass
    pub fn with_mesh_and_material(mesh: Arc<Mesh>, material: Arc<Material>) -> Self {
        let mut render_data = Self::new();
        render_data.mesh = Some(mesh);
        render_data.passes[0] = RenderPass::new(material);
        render_data
    }

    /// Mesh, if any
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Replace the mesh
    pub fn set_mesh(&mut self, mesh: Option<Arc<Mesh>>) {
        self.mesh = mesh;
    }

    /// All passes in draw order
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    /// Pass by index
    pub fn pass(&self, index: usize) -> Option<&RenderPass> {
        self.passes.get(index)
    }

    /// Mutable pass by index
    pub fn pass_mut(&mut self, index: usize) -> Option<&mut RenderPass> {
        self.passes.get_mut(index)
    }

    /// Append a pass
    pub fn add_pass(&mut self, pass: RenderPass) {
        self.passes.push(pass);
    }

    /// Material of the first pass
    pub fn material(&self) -> Option<&Arc<Material>> {
        self.passes.first().and_then(|pass| pass.material.as_ref())
    }

    /// Set the material of the first pass
    pub fn set_material(&mut self, material: Option<Arc<Material>>) {
        if let Some(pass) = self.passes.first_mut() {
            pass.material = material;
        }
    }

    /// Cull mode of the first pass
    pub fn cull_face(&self) -> CullFace {
        self.passes.first().map_or(CullFace::Back, |pass| pass.cull_face)
    }

    /// Set the cull mode of every pass
    pub fn set_cull_face(&mut self, cull_face: CullFace) {
        for pass in &mut self.passes {
            pass.cull_face = cull_face;
        }
    }

    /// Sort bucket
    pub fn rendering_order(&self) -> i32 {
        self.rendering_order
    }

    /// Set the sort bucket (see [`RenderingOrder`])
    pub fn set_rendering_order(&mut self, rendering_order: i32) {
        self.rendering_order = rendering_order;
    }

    /// Eyes this is drawn for
    pub fn render_mask(&self) -> RenderMask {
        self.render_mask
    }

    /// Restrict drawing to some eyes
    pub fn set_render_mask(&mut self, render_mask: RenderMask) {
        self.render_mask = render_mask;
    }

    /// Hidden render data is culled and sorted but not drawn
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether polygon offset is applied
    pub fn offset(&self) -> bool {
        self.offset
    }

    /// Enable polygon offset
    pub fn set_offset(&mut self, offset: bool) {
        self.offset = offset;
    }

    /// Polygon offset factor
    pub fn offset_factor(&self) -> f32 {
        self.offset_factor
    }

    /// Set the polygon offset factor
    pub fn set_offset_factor(&mut self, factor: f32) {
        self.offset_factor = factor;
    }

    /// Polygon offset units
    pub fn offset_units(&self) -> f32 {
        self.offset_units
    }

    /// Set the polygon offset units
    pub fn set_offset_units(&mut self, units: f32) {
        self.offset_units = units;
    }

    /// Whether the depth test is on while drawing
    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// Turn the depth test on or off for this object
    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.depth_test = depth_test;
    }

    /// Whether blending is on while drawing
    pub fn alpha_blend(&self) -> bool {
        self.alpha_blend
    }

    /// Turn blending on or off for this object
    pub fn set_alpha_blend(&mut self, alpha_blend: bool) {
        self.alpha_blend = alpha_blend;
    }

    /// Squared eye distance written by the last frustum-culled pass
    pub fn camera_distance_squared(&self) -> f32 {
        self.camera_distance_squared
    }

    /// Object this is attached to
    pub fn owner(&self) -> Option<SceneObjectId> {
        self.owner
    }
}

impl Default for RenderData {
    fn default() -> Self {
        Self::new()
    }
}
