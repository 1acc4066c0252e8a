//! Scene: arena of objects and render data forming one tree
//!
//! Objects and render data live in slot maps and refer to each other by key.
//! Each object owns an ordered list of child keys and a plain parent key, so
//! ownership flows strictly downward and cycles are rejected when they would
//! be created.

use slotmap::SlotMap;

use crate::config::SceneConfig;
use crate::error::{Result, StructuralError};
use crate::foundation::math::Mat4;
use crate::scene::render_data::RenderData;
use crate::scene::scene_object::SceneObject;
use crate::scene::transform::TransformMut;
use crate::scene::{RenderDataId, SceneObjectId};

/// Root container of the scene tree
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) objects: SlotMap<SceneObjectId, SceneObject>,
    pub(crate) render_data: SlotMap<RenderDataId, RenderData>,
    root: SceneObjectId,
    config: SceneConfig,
    frustum_culling: bool,
    occlusion_culling: bool,
}

impl Scene {
    /// Empty scene with a root object named `"root"`
    pub fn new(config: SceneConfig) -> Self {
        let mut objects = SlotMap::with_key();
        let root = objects.insert(SceneObject::new("root", config.check_frames));
        Self {
            objects,
            render_data: SlotMap::with_key(),
            root,
            frustum_culling: config.frustum_culling,
            occlusion_culling: config.occlusion_culling,
            config,
        }
    }

    /// Root object; only objects below it are rendered
    pub fn root(&self) -> SceneObjectId {
        self.root
    }

    /// Configuration the scene was built with
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Whether frustum culling is on
    pub fn frustum_culling(&self) -> bool {
        self.frustum_culling
    }

    /// Turn frustum culling on or off
    pub fn set_frustum_culling(&mut self, enabled: bool) {
        self.frustum_culling = enabled;
    }

    /// Whether occlusion culling is on
    pub fn occlusion_culling(&self) -> bool {
        self.occlusion_culling
    }

    /// Turn occlusion culling on or off
    pub fn set_occlusion_culling(&mut self, enabled: bool) {
        self.occlusion_culling = enabled;
    }

    /// Number of live objects, root included
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Create a detached object
    pub fn create_object(&mut self, name: impl Into<String>) -> SceneObjectId {
        self.objects
            .insert(SceneObject::new(name, self.config.check_frames))
    }

    /// Create an object directly under `parent`
    pub fn create_child(&mut self, parent: SceneObjectId, name: impl Into<String>) -> Result<SceneObjectId> {
        self.object(parent)?;
        let child = self.create_object(name);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Whether `id` refers to a live object
    pub fn contains(&self, id: SceneObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Look up an object
    pub fn object(&self, id: SceneObjectId) -> Result<&SceneObject> {
        self.objects.get(id).ok_or(StructuralError::UnknownObject(id))
    }

    /// Look up an object for changing its settings
    pub fn object_mut(&mut self, id: SceneObjectId) -> Result<&mut SceneObject> {
        self.objects.get_mut(id).ok_or(StructuralError::UnknownObject(id))
    }

    /// Find the first object with `name`, breadth first from the root
    pub fn find_by_name(&self, name: &str) -> Option<SceneObjectId> {
        std::iter::once(self.root)
            .chain(self.flatten())
            .find(|&id| self.objects.get(id).is_some_and(|object| object.name() == name))
    }

    /// Whether `ancestor` is `id` itself or above it
    pub fn is_ancestor(&self, ancestor: SceneObjectId, id: SceneObjectId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.objects.get(node).and_then(|object| object.parent);
        }
        false
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// Fails with [`StructuralError::Cycle`] when `child` is `parent` or one of
    /// its ancestors, and with [`StructuralError::RootObject`] for the root. A child that already has a parent is moved.
    pub fn add_child(&mut self, parent: SceneObjectId, child: SceneObjectId) -> Result<()> {
        self.object(parent)?;
        let previous_parent = self.object(child)?.parent;

        if child == self.root {
            return Err(StructuralError::RootObject);
        }
        if self.is_ancestor(child, parent) {
            return Err(StructuralError::Cycle { parent, child });
        }

        if let Some(previous) = previous_parent {
            self.remove_child(previous, child)?;
        }

        if let Some(object) = self.objects.get_mut(parent) {
            object.children.push(child);
        }
        if let Some(object) = self.objects.get_mut(child) {
            object.parent = Some(parent);
        }
        self.invalidate_transform(child);
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// Returns `false` without changes when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: SceneObjectId, child: SceneObjectId) -> Result<bool> {
        self.object(parent)?;
        if self.object(child)?.parent != Some(parent) {
            return Ok(false);
        }

        if let Some(object) = self.objects.get_mut(parent) {
            object.children.retain(|&c| c != child);
        }
        if let Some(object) = self.objects.get_mut(child) {
            object.parent = None;
        }
        self.invalidate_transform(child);
        Ok(true)
    }

    /// Number of children of `parent`
    pub fn child_count(&self, parent: SceneObjectId) -> Result<usize> {
        Ok(self.object(parent)?.child_count())
    }

    /// Child by position
    pub fn child_at(&self, parent: SceneObjectId, index: usize) -> Result<SceneObjectId> {
        let children = &self.object(parent)?.children;
        children
            .get(index)
            .copied()
            .ok_or(StructuralError::ChildIndexOutOfRange {
                index,
                count: children.len(),
            })
    }

    /// Every object below the root, breadth first, root excluded
    pub fn flatten(&self) -> Vec<SceneObjectId> {
        let mut flattened: Vec<SceneObjectId> = self
            .objects
            .get(self.root)
            .map(|root| root.children.clone())
            .unwrap_or_default();

        let mut index = 0;
        while index < flattened.len() {
            if let Some(object) = self.objects.get(flattened[index]) {
                flattened.extend_from_slice(&object.children);
            }
            index += 1;
        }
        flattened
    }

    /// Remove `id` and its whole subtree
    ///
    /// Render data attached to removed objects is detached and kept. An object
    /// removed while its occlusion query is still pending leaks the query
    /// handle; this is logged. Returns the number of removed objects.
    pub fn destroy_object(&mut self, id: SceneObjectId) -> Result<usize> {
        if id == self.root {
            return Err(StructuralError::RootObject);
        }
        if let Some(parent) = self.object(id)?.parent {
            self.remove_child(parent, id)?;
        }

        let mut pending = vec![id];
        let mut removed = 0;
        while let Some(current) = pending.pop() {
            let Some(object) = self.objects.remove(current) else {
                continue;
            };
            if object.is_query_issued() {
                log::warn!(
                    "Scene object '{}' destroyed with occlusion query {:?} still pending; the query is never read",
                    object.name(),
                    object.query
                );
            }
            if let Some(render_data) = object.render_data.and_then(|rd| self.render_data.get_mut(rd)) {
                render_data.owner = None;
            }
            pending.extend_from_slice(&object.children);
            removed += 1;
        }

        log::debug!("Destroyed {removed} scene object(s)");
        Ok(removed)
    }

    /// Store render data in the scene, unattached
    pub fn create_render_data(&mut self, render_data: RenderData) -> RenderDataId {
        let mut render_data = render_data;
        render_data.owner = None;
        self.render_data.insert(render_data)
    }

    /// Look up render data
    pub fn render_data(&self, id: RenderDataId) -> Result<&RenderData> {
        self.render_data.get(id).ok_or(StructuralError::UnknownRenderData(id))
    }

    /// Look up render data for changing it
    pub fn render_data_mut(&mut self, id: RenderDataId) -> Result<&mut RenderData> {
        self.render_data
            .get_mut(id)
            .ok_or(StructuralError::UnknownRenderData(id))
    }

    /// Render data attached to an object
    pub fn render_data_of(&self, object: SceneObjectId) -> Option<&RenderData> {
        self.objects
            .get(object)
            .and_then(|o| o.render_data)
            .and_then(|rd| self.render_data.get(rd))
    }

    /// Attach `render_data` to `object`
    ///
    /// Whatever `object` had attached is detached first, and `render_data` is
    /// taken away from its previous owner, so each render data has at most one
    /// owner.
    pub fn attach_render_data(&mut self, object: SceneObjectId, render_data: RenderDataId) -> Result<()> {
        self.object(object)?;
        let previous_owner = self.render_data(render_data)?.owner;

        self.detach_render_data(object)?;
        if let Some(owner) = previous_owner {
            self.detach_render_data(owner)?;
        }

        if let Some(o) = self.objects.get_mut(object) {
            o.render_data = Some(render_data);
        }
        if let Some(rd) = self.render_data.get_mut(render_data) {
            rd.owner = Some(object);
        }
        Ok(())
    }

    /// Detach whatever render data `object` has
    pub fn detach_render_data(&mut self, object: SceneObjectId) -> Result<Option<RenderDataId>> {
        let detached = self.object_mut(object)?.render_data.take();
        if let Some(rd) = detached.and_then(|id| self.render_data.get_mut(id)) {
            rd.owner = None;
        }
        Ok(detached)
    }

    /// Remove render data from the scene, detaching it first
    pub fn destroy_render_data(&mut self, id: RenderDataId) -> Result<RenderData> {
        if let Some(owner) = self.render_data(id)?.owner {
            self.detach_render_data(owner)?;
        }
        self.render_data
            .remove(id)
            .ok_or(StructuralError::UnknownRenderData(id))
    }

    /// Write access to an object's transform
    pub fn transform_mut(&mut self, id: SceneObjectId) -> Result<TransformMut<'_>> {
        self.object(id)?;
        Ok(TransformMut::new(self, id))
    }

    /// World matrix of an object, recomputed along the parent chain as needed
    pub fn world_matrix(&self, id: SceneObjectId) -> Result<Mat4> {
        Ok(self.world_matrix_of(self.object(id)?))
    }

    pub(crate) fn world_matrix_of(&self, object: &SceneObject) -> Mat4 {
        if let Some(cached) = object.transform.cached_world_matrix() {
            return cached;
        }

        let local = object.transform.local_matrix();
        let world = match object.parent.and_then(|p| self.objects.get(p)) {
            Some(parent) => self.world_matrix_of(parent) * local,
            None => local,
        };
        object.transform.store_world_matrix(world);
        world
    }

    /// Drop cached world matrices of `id` and below
    ///
    /// Stops at objects whose cache is already invalid: a valid cache below an
    /// invalid one cannot exist, since computing it validates the parent.
    pub(crate) fn invalidate_transform(&self, id: SceneObjectId) {
        let Some(object) = self.objects.get(id) else {
            return;
        };
        if object.transform.invalidate() {
            for &child in &object.children {
                self.invalidate_transform(child);
            }
        }
    }

    /// Whether the world-space bounding boxes of two objects overlap
    ///
    /// Objects without a mesh never collide.
    pub fn is_colliding(&self, a: SceneObjectId, b: SceneObjectId) -> Result<bool> {
        let world_box = |id: SceneObjectId| -> Result<_> {
            let object = self.object(id)?;
            let aabb = self
                .render_data_of(id)
                .and_then(|rd| rd.mesh())
                .and_then(|mesh| mesh.bounding_box());
            Ok(aabb.map(|aabb| aabb.transformed(&self.world_matrix_of(object))))
        };

        match (world_box(a)?, world_box(b)?) {
            (Some(box_a), Some(box_b)) => Ok(box_a.overlaps(&box_b)),
            _ => Ok(false),
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
