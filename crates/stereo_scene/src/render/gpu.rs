//! GPU context abstraction
//!
//! The scene core drives the GPU through this trait only: fixed-function
//! state toggles, occlusion queries and draw submission. Program compilation,
//! uniform upload and buffer management stay with the implementor.
//!
//! Occlusion queries follow a submit/poll pattern. [`GpuContext::poll_query`]
//! must never block; returning `None` means "not available yet, ask again next
//! frame".

use crate::foundation::math::{Mat4, Vec3};
use crate::resources::{GeometryHandle, ShaderType};
use crate::scene::CullFace;

/// Opaque occlusion query object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHandle(pub u32);

/// Program a draw call is executed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Program selected by a material's shader type
    Material(ShaderType),
    /// Flat program used for occlusion proxies
    BoundingBox,
    /// Highly visible fallback for objects that failed to draw
    Error,
}

/// Geometry a draw call submits
#[derive(Debug, Clone, PartialEq)]
pub enum DrawGeometry {
    /// Geometry the application uploaded, referenced by handle
    Uploaded(GeometryHandle),
    /// Triangles sent with the draw itself, as for occlusion proxies
    Streamed {
        /// Vertex positions
        vertices: Vec<Vec3>,
        /// Triangle indices, three per triangle
        indices: Vec<u32>,
    },
}

/// One draw submission
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Program to draw with
    pub program: Program,
    /// Geometry to draw
    pub geometry: DrawGeometry,
    /// Model-view-projection matrix
    pub mvp: Mat4,
    /// Whether this draw is for the right eye (stereo texture selection)
    pub right_eye: bool,
    /// Name of the scene object being drawn
    pub label: String,
}

/// Immediate-mode GPU interface used by the renderer
pub trait GpuContext {
    /// Enable or disable the depth test
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable blending
    fn set_blend(&mut self, enabled: bool);

    /// Select the culled face; [`CullFace::None`] disables face culling
    fn set_cull_face(&mut self, cull_face: CullFace);

    /// Enable polygon offset with `(factor, units)`, or disable it with `None`
    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>);

    /// Enable or disable colour writes
    fn set_color_mask(&mut self, enabled: bool);

    /// Clear colour and depth
    fn clear(&mut self, color: [f32; 4]);

    /// Allocate a query object
    fn create_query(&mut self) -> QueryHandle;

    /// Start counting samples into `query`
    fn begin_query(&mut self, query: QueryHandle);

    /// Stop counting samples into `query` and submit it
    fn end_query(&mut self, query: QueryHandle);

    /// Sample count of a submitted query, `None` while the result is not available
    fn poll_query(&mut self, query: QueryHandle) -> Option<u32>;

    /// Submit a draw
    fn draw(&mut self, call: &DrawCall);
}
