//! Pickability component of scene objects

use crate::foundation::math::Vec3;

/// Geometry a pick ray is tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointeeKind {
    /// The mesh's local bounding box
    #[default]
    BoundingBox,
    /// Every triangle of the mesh
    Mesh,
}

/// Marks a scene object as pickable and remembers where it was last hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePointeeHolder {
    enabled: bool,
    kind: PointeeKind,
    hit: Option<Vec3>,
}

impl EyePointeeHolder {
    /// Enabled holder testing against `kind`
    pub fn new(kind: PointeeKind) -> Self {
        Self {
            enabled: true,
            kind,
            hit: None,
        }
    }

    /// Whether scene picking considers the owner
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable picking
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Geometry tested
    pub fn kind(&self) -> PointeeKind {
        self.kind
    }

    /// Change the geometry tested
    pub fn set_kind(&mut self, kind: PointeeKind) {
        self.kind = kind;
    }

    /// World-space point of the last scene pick that hit the owner
    pub fn hit(&self) -> Option<Vec3> {
        self.hit
    }

    pub(crate) fn set_hit(&mut self, hit: Option<Vec3>) {
        self.hit = hit;
    }
}

impl Default for EyePointeeHolder {
    fn default() -> Self {
        Self::new(PointeeKind::default())
    }
}
