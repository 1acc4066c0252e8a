//! Mesh geometry for culling and picking
//!
//! The scene core never uploads vertex data itself. A [`Mesh`] keeps the
//! positions and triangle indices on the CPU (for bounds and ray picking)
//! together with the [`GeometryHandle`] the embedding renderer uses to draw it.
//!
//! Bounding volumes are computed on first use and cached until the vertex data
//! is replaced.

use std::sync::OnceLock;

use crate::foundation::math::Vec3;
use crate::scene::bounds::{Aabb, BoundingSphere};

/// Opaque handle to uploaded geometry, owned by the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GeometryHandle(pub u64);

/// Triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    geometry: GeometryHandle,
    bounding_box: OnceLock<Option<Aabb>>,
    bounding_sphere: OnceLock<Option<BoundingSphere>>,
}

/// Triangle corner indices shared by [`Mesh::cube`] and [`Mesh::bounding_box_mesh`]
const BOX_INDICES: [u32; 36] = [
    // Front
    0, 1, 2, 2, 3, 0,
    // Back
    4, 5, 6, 6, 7, 4,
    // Left
    4, 0, 3, 3, 5, 4,
    // Right
    1, 7, 6, 6, 2, 1,
    // Top
    3, 2, 6, 6, 5, 3,
    // Bottom
    4, 7, 1, 1, 0, 4,
];

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Self::default()
        }
    }

    /// Builder pattern: attach the drawable geometry handle
    pub fn with_geometry(mut self, geometry: GeometryHandle) -> Self {
        self.geometry = geometry;
        self
    }

    /// Box spanning `min..max` as 8 corners and 12 triangles
    pub fn from_box(min: Vec3, max: Vec3) -> Self {
        let vertices = vec![
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, min.y, min.z),
        ];
        Self::new(vertices, BOX_INDICES.to_vec())
    }

    /// Cube centered at the origin with vertices at ±1.0 on each axis
    pub fn cube() -> Self {
        Self::from_box(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    /// Unit quad in the XY plane facing +Z, two triangles
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let vertices = vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Replace the vertex data and drop cached bounds
    pub fn set_vertices(&mut self, vertices: Vec<Vec3>) {
        self.vertices = vertices;
        self.bounding_box = OnceLock::new();
        self.bounding_sphere = OnceLock::new();
    }

    /// Replace the triangle indices
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
    }

    /// Handle the renderer draws
    pub fn geometry(&self) -> GeometryHandle {
        self.geometry
    }

    /// Cached local-space bounding box, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<Aabb> {
        *self.bounding_box.get_or_init(|| Aabb::from_points(&self.vertices))
    }

    /// Cached local-space bounding sphere, `None` for an empty mesh
    ///
    /// Centred on the bounding box, radius reaching the farthest vertex.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        *self
            .bounding_sphere
            .get_or_init(|| BoundingSphere::from_points(&self.vertices))
    }

    /// Fresh box mesh enclosing this mesh, used as occlusion-query proxy
    ///
    /// The proxy has no uploaded geometry of its own; its triangles are
    /// streamed with the query draw.
    pub fn bounding_box_mesh(&self) -> Option<Mesh> {
        let aabb = self.bounding_box()?;
        Some(Self::from_box(aabb.min, aabb.max))
    }

    /// Take the vertex and index buffers
    pub fn into_buffers(self) -> (Vec<Vec3>, Vec<u32>) {
        (self.vertices, self.indices)
    }

    /// Iterate triangles as vertex triples
    ///
    /// Trailing indices that do not form a full triangle and indices past the
    /// vertex array are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([*a, *b, *c])
        })
    }
}
