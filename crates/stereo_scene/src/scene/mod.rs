//! Scene graph
//!
//! A [`Scene`] owns every [`SceneObject`] and [`RenderData`] in slot-map
//! arenas. Objects form a strict tree under the scene root; each object has a
//! [`Transform`] whose world matrix is computed lazily and cached until the
//! object or one of its ancestors changes.

pub mod bounds;
pub mod graph;
pub mod render_data;
pub mod scene_object;
pub mod transform;
pub mod visibility;

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a scene object
    pub struct SceneObjectId;

    /// Handle to render data
    pub struct RenderDataId;
}

pub use bounds::{Aabb, BoundingSphere};
pub use graph::Scene;
pub use render_data::{CullFace, RenderData, RenderMask, RenderPass, RenderingOrder};
pub use scene_object::{LodRange, SceneObject};
pub use transform::{Transform, TransformMut};
pub use visibility::{OcclusionState, VisibilityFilter};
