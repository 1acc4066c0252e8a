//! Rendering: GPU abstraction, shaders, culling and per-eye dispatch
//!
//! The renderer never talks to a graphics API directly. It drives a
//! [`GpuContext`], which the application implements on top of its API of
//! choice; [`backends::HeadlessGpu`] records commands for tests and offline
//! runs.

pub mod backends;
pub mod culling;
pub mod gpu;
pub mod renderer;
pub mod shader;
pub mod sort;

pub use gpu::{DrawCall, DrawGeometry, GpuContext, Program, QueryHandle};
pub use renderer::{RenderStats, Renderer};
pub use shader::{BoundingBoxShader, DrawContext, ErrorShader, MaterialShader, Shader, ShaderFactory, ShaderManager};
