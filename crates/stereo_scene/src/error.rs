//! Error types
//!
//! Two kinds of failure exist and they are never mixed:
//!
//! - [`StructuralError`] is a contract violation by the caller (a cycle in the
//!   tree, an out-of-range child index, a stale handle). It aborts the
//!   operation and is returned to the embedding layer.
//! - [`RenderDispatchError`] is raised while drawing a single object. The
//!   renderer catches it, logs it and substitutes the error render for that
//!   object so the rest of the frame continues.

use thiserror::Error;

use crate::resources::ShaderType;
use crate::scene::{RenderDataId, SceneObjectId};

/// Result alias for scene mutation APIs
pub type Result<T> = std::result::Result<T, StructuralError>;

/// Fatal misuse of the scene graph API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// `child` is `parent` itself or one of its ancestors
    #[error("cycle of scene objects is not allowed: {child:?} is an ancestor of {parent:?}")]
    Cycle {
        /// Object that would have received the child
        parent: SceneObjectId,
        /// Object that was to be attached
        child: SceneObjectId,
    },

    /// Child lookup past the end of the children list
    #[error("child index {index} out of range (object has {count} children)")]
    ChildIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of children
        count: usize,
    },

    /// The scene root cannot be destroyed or reparented
    #[error("operation not allowed on the scene root")]
    RootObject,

    /// Handle does not refer to a live scene object
    #[error("unknown scene object: {0:?}")]
    UnknownObject(SceneObjectId),

    /// Handle does not refer to live render data
    #[error("unknown render data: {0:?}")]
    UnknownRenderData(RenderDataId),
}

/// Recoverable failure while dispatching one object to its shader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderDispatchError {
    /// Nothing is registered for the material's shader type
    #[error("no shader registered for shader type {0:?}")]
    UnknownShader(ShaderType),

    /// Material lacks a value the shader needs
    #[error("material is missing required key '{key}'")]
    MissingMaterialKey {
        /// Missing key
        key: String,
    },

    /// Material value has the wrong kind
    #[error("material key '{key}' has the wrong type (expected {expected})")]
    WrongValueType {
        /// Offending key
        key: String,
        /// Kind the shader expected
        expected: &'static str,
    },

    /// Render data has no mesh to draw
    #[error("render data has no mesh")]
    NoMesh,

    /// Any other shader-reported failure
    #[error("shader failed: {0}")]
    Shader(String),
}
