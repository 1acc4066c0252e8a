//! Resources consumed by the scene: meshes and materials
//!
//! Both are shared between render data through `Arc`, so several objects can
//! draw the same mesh with different materials.

pub mod material;
pub mod mesh;

pub use material::{Material, MaterialValue, ShaderType, TextureHandle};
pub use mesh::{GeometryHandle, Mesh};
