//! # Stereo Scene
//!
//! Scene graph core for rendering a 3D scene on a stereoscopic head-mounted
//! display, once per eye per frame.
//!
//! ## Features
//!
//! - **Scene Graph**: Arena-backed object tree with cycle rejection and
//!   single-owner render data
//! - **Lazy Transforms**: World matrices are cached per object and recomputed
//!   only after a local change on the object or one of its ancestors
//! - **Culling**: Per-object frustum test, LOD bands, and asynchronous GPU
//!   occlusion queries smoothed by a visibility hysteresis
//! - **Render Ordering**: Stable sort by rendering order and eye distance, with
//!   fail-soft per-object dispatch
//! - **Picking**: Ray against bounding boxes and triangle meshes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stereo_scene::prelude::*;
//!
//! let mut scene = Scene::default();
//! let cube = scene.create_child(scene.root(), "cube").unwrap();
//! let material = Material::new(ShaderType::ExternalRenderer);
//! let render_data = scene.create_render_data(RenderData::with_mesh_and_material(
//!     Arc::new(Mesh::cube()),
//!     Arc::new(material),
//! ));
//! scene.attach_render_data(cube, render_data).unwrap();
//! scene.transform_mut(cube).unwrap().set_position(Vec3::new(0.0, 0.0, -5.0));
//!
//! let mut renderer = Renderer::new(RendererConfig::default());
//! let mut gpu = HeadlessGpu::new();
//! let projection = Mat4::new_perspective(1.0, 1.57, 0.1, 100.0);
//! renderer.render_eye_view(&mut scene, &mut gpu, &Mat4::identity(), &projection, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod picking;
pub mod render;
pub mod resources;
pub mod scene;

#[cfg(test)]
mod tests;

pub use error::{RenderDispatchError, Result, StructuralError};

/// Common imports for users of the scene graph
pub mod prelude {
    pub use crate::{
        config::{ApplicationConfig, Config, RendererConfig, SceneConfig},
        error::{RenderDispatchError, StructuralError},
        foundation::math::{Mat4, Quat, Vec3},
        picking::{EyePointeeHolder, PickSpace, Picker, PointeeKind, Ray},
        render::{backends::HeadlessGpu, GpuContext, RenderStats, Renderer, ShaderManager},
        resources::{Material, Mesh, ShaderType, TextureHandle},
        scene::{
            RenderData, RenderDataId, RenderMask, RenderingOrder, Scene, SceneObject, SceneObjectId,
        },
    };
}
