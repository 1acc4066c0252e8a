//! Materials: a shader-type tag plus a key → value store
//!
//! The store is consumed by the shader dispatch in
//! [`render::shader`](crate::render::shader). Lookups that fail produce a
//! [`RenderDispatchError`], which the renderer treats as a per-object,
//! recoverable failure.

use std::collections::HashMap;

use crate::error::RenderDispatchError;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Shader family a material is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// Unlit texture packed side by side for left/right eyes
    UnlitHorizontalStereo,
    /// Unlit texture packed top/bottom for left/right eyes
    UnlitVerticalStereo,
    /// External (OES) texture, e.g. video surfaces
    Oes,
    /// External texture packed side by side
    OesHorizontalStereo,
    /// External texture packed top/bottom
    OesVerticalStereo,
    /// Cubemap sky
    Cubemap,
    /// Cubemap reflection
    CubemapReflection,
    /// Plain lit texture
    Texture,
    /// Drawn by a host-provided renderer
    ExternalRenderer,
    /// Imported model material
    Assimp,
    /// Application-registered shader
    Custom(u32),
}

/// Opaque texture handle owned by the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Value stored under a material key
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialValue {
    /// Scalar
    Float(f32),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector (colours)
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Texture reference
    Texture(TextureHandle),
}

impl MaterialValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Texture(_) => "texture",
        }
    }
}

/// Material: shader-type tag and uniform store
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader_type: ShaderType,
    values: HashMap<String, MaterialValue>,
}

impl Material {
    /// Create an empty material for a shader type
    pub fn new(shader_type: ShaderType) -> Self {
        Self {
            shader_type,
            values: HashMap::new(),
        }
    }

    /// Shader-type tag used to select the shader
    pub fn shader_type(&self) -> ShaderType {
        self.shader_type
    }

    /// Store a value under `key`, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: MaterialValue) {
        self.values.insert(key.into(), value);
    }

    /// Builder pattern: store a value
    pub fn with(mut self, key: impl Into<String>, value: MaterialValue) -> Self {
        self.set(key, value);
        self
    }

    /// Builder pattern: store a texture
    pub fn with_texture(self, key: impl Into<String>, texture: TextureHandle) -> Self {
        self.with(key, MaterialValue::Texture(texture))
    }

    /// Builder pattern: store a colour
    pub fn with_color(self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.with("color", MaterialValue::Vec4(Vec4::new(r, g, b, a)))
    }

    /// Raw lookup
    pub fn get(&self, key: &str) -> Option<&MaterialValue> {
        self.values.get(key)
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<MaterialValue> {
        self.values.remove(key)
    }

    fn require(&self, key: &str) -> Result<&MaterialValue, RenderDispatchError> {
        self.values.get(key).ok_or_else(|| RenderDispatchError::MissingMaterialKey {
            key: key.to_string(),
        })
    }

    fn wrong_type(key: &str, expected: &'static str) -> RenderDispatchError {
        RenderDispatchError::WrongValueType {
            key: key.to_string(),
            expected,
        }
    }

    /// Required scalar
    pub fn float(&self, key: &str) -> Result<f32, RenderDispatchError> {
        match self.require(key)? {
            MaterialValue::Float(v) => Ok(*v),
            _ => Err(Self::wrong_type(key, "float")),
        }
    }

    /// Required 4-component vector
    pub fn vec4(&self, key: &str) -> Result<Vec4, RenderDispatchError> {
        match self.require(key)? {
            MaterialValue::Vec4(v) => Ok(*v),
            _ => Err(Self::wrong_type(key, "vec4")),
        }
    }

    /// Required texture
    pub fn texture(&self, key: &str) -> Result<TextureHandle, RenderDispatchError> {
        match self.require(key)? {
            MaterialValue::Texture(t) => Ok(*t),
            _ => Err(Self::wrong_type(key, "texture")),
        }
    }

    /// Check that `key` exists and has the kind `expected`
    pub fn expect_kind(&self, key: &str, expected: &'static str) -> Result<(), RenderDispatchError> {
        let value = self.require(key)?;
        if value.kind() == expected {
            Ok(())
        } else {
            Err(Self::wrong_type(key, expected))
        }
    }
}
