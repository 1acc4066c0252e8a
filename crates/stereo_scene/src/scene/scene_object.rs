//! Scene object: a node of the scene tree

use crate::picking::EyePointeeHolder;
use crate::render::QueryHandle;
use crate::scene::transform::Transform;
use crate::scene::visibility::{OcclusionState, VisibilityFilter};
use crate::scene::{RenderDataId, SceneObjectId};

/// Distance band an object is drawn in, stored squared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodRange {
    min_squared: f32,
    max_squared: f32,
}

impl LodRange {
    /// Band `[min, max)` in world units
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min_squared: min * min,
            max_squared: max * max,
        }
    }

    /// Lower bound, squared
    pub fn min_squared(&self) -> f32 {
        self.min_squared
    }

    /// Upper bound, squared
    pub fn max_squared(&self) -> f32 {
        self.max_squared
    }

    /// Whether a squared distance lies in the band
    pub fn contains_squared(&self, distance_squared: f32) -> bool {
        distance_squared >= self.min_squared && distance_squared < self.max_squared
    }
}

impl Default for LodRange {
    fn default() -> Self {
        Self {
            min_squared: 0.0,
            max_squared: f32::MAX,
        }
    }
}

/// Node of the scene tree
///
/// Objects are stored in the [`Scene`](crate::scene::Scene) arena and refer to
/// each other by [`SceneObjectId`]. Structure is changed through the scene;
/// the per-object settings here can be changed through
/// [`Scene::object_mut`](crate::scene::Scene::object_mut).
#[derive(Debug, Clone)]
pub struct SceneObject {
    name: String,
    pub(crate) transform: Transform,
    pub(crate) parent: Option<SceneObjectId>,
    pub(crate) children: Vec<SceneObjectId>,
    pub(crate) render_data: Option<RenderDataId>,
    pub(crate) eye_pointee_holder: Option<EyePointeeHolder>,
    pub(crate) visibility: VisibilityFilter,
    pub(crate) in_frustum: bool,
    pub(crate) occlusion: OcclusionState,
    pub(crate) query: Option<QueryHandle>,
    lod: LodRange,
    using_lod: bool,
}

impl SceneObject {
    pub(crate) fn new(name: impl Into<String>, check_frames: i32) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            parent: None,
            children: Vec::new(),
            render_data: None,
            eye_pointee_holder: None,
            visibility: VisibilityFilter::new(check_frames),
            in_frustum: false,
            occlusion: OcclusionState::NoQueryIssued,
            query: None,
            lod: LodRange::default(),
            using_lod: false,
        }
    }

    /// Name used in log messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Transform (read-only; write through `Scene::transform_mut`)
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Parent object, `None` for the root and detached objects
    pub fn parent(&self) -> Option<SceneObjectId> {
        self.parent
    }

    /// Children in traversal order
    pub fn children(&self) -> &[SceneObjectId] {
        &self.children
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attached render data
    pub fn render_data(&self) -> Option<RenderDataId> {
        self.render_data
    }

    /// Picking component
    pub fn eye_pointee_holder(&self) -> Option<&EyePointeeHolder> {
        self.eye_pointee_holder.as_ref()
    }

    /// Mutable picking component
    pub fn eye_pointee_holder_mut(&mut self) -> Option<&mut EyePointeeHolder> {
        self.eye_pointee_holder.as_mut()
    }

    /// Attach or replace the picking component
    pub fn set_eye_pointee_holder(&mut self, holder: Option<EyePointeeHolder>) {
        self.eye_pointee_holder = holder;
    }

    /// Filtered occlusion visibility
    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    /// Feed one raw visibility signal into the hysteresis filter
    pub fn record_visibility(&mut self, signal: bool) -> bool {
        self.visibility.record(signal)
    }

    /// Hysteresis state
    pub fn visibility(&self) -> &VisibilityFilter {
        &self.visibility
    }

    /// Result of the last frustum test
    pub fn in_frustum(&self) -> bool {
        self.in_frustum
    }

    /// Occlusion query lifecycle
    pub fn occlusion_state(&self) -> OcclusionState {
        self.occlusion
    }

    /// Whether a query is outstanding
    pub fn is_query_issued(&self) -> bool {
        self.occlusion == OcclusionState::QueryPending
    }

    /// Query object reused for every occlusion query of this object
    pub fn query_handle(&self) -> Option<QueryHandle> {
        self.query
    }

    /// Draw only between `min` and `max` (world units) from the eye
    pub fn set_lod_range(&mut self, min: f32, max: f32) {
        self.lod = LodRange::new(min, max);
        self.using_lod = true;
    }

    /// Draw at any distance
    pub fn clear_lod_range(&mut self) {
        self.lod = LodRange::default();
        self.using_lod = false;
    }

    /// Configured LOD band
    pub fn lod_range(&self) -> LodRange {
        self.lod
    }

    /// Whether a LOD band is configured
    pub fn using_lod(&self) -> bool {
        self.using_lod
    }

    /// Whether a squared eye distance passes the LOD gate
    pub fn in_lod_range(&self, distance_squared: f32) -> bool {
        !self.using_lod || self.lod.contains_squared(distance_squared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_state() {
        let object = SceneObject::new("lamp", 12);
        assert_eq!(object.name(), "lamp");
        assert!(object.is_visible());
        assert!(!object.in_frustum());
        assert!(!object.is_query_issued());
        assert!(object.query_handle().is_none());
        assert_eq!(object.visibility().check_frames(), 12);
    }

    #[test]
    fn test_lod_range_is_half_open() {
        let mut object = SceneObject::new("lod", 12);
        assert!(object.in_lod_range(1.0e12));

        object.set_lod_range(2.0, 10.0);
        assert!(object.using_lod());
        assert!(!object.in_lod_range(3.9));
        assert!(object.in_lod_range(4.0));
        assert!(object.in_lod_range(99.9));
        assert!(!object.in_lod_range(100.0));

        object.clear_lod_range();
        assert!(object.in_lod_range(1.0e12));
    }
}
