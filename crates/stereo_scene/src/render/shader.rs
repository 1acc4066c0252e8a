//! Shader registry and built-in shaders
//!
//! A [`ShaderManager`] maps shader-type tags to [`Shader`] instances. Shaders
//! are built from registered factories the first time a material asks for
//! them, so unused shader families cost nothing. The manager is owned by the
//! [`Renderer`](crate::render::Renderer); there is no process-wide registry.
//!
//! The built-in shaders do not compile programs. They check that the material
//! carries the values the program would bind, derive the matrices it would
//! upload, and submit a [`DrawCall`].

use std::collections::HashMap;

use crate::error::RenderDispatchError;
use crate::foundation::math::Mat4;
use crate::render::gpu::{DrawCall, DrawGeometry, GpuContext, Program};
use crate::resources::{Material, ShaderType};
use crate::scene::RenderData;

/// Everything a shader needs to draw one pass of one object
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    /// Name of the object being drawn
    pub label: &'a str,
    /// Render data being drawn
    pub render_data: &'a RenderData,
    /// Material of the current pass
    pub material: &'a Material,
    /// Object world matrix
    pub model: Mat4,
    /// Eye view matrix
    pub view: Mat4,
    /// Eye projection matrix
    pub projection: Mat4,
    /// `view * model`
    pub mv: Mat4,
    /// `projection * view * model`
    pub mvp: Mat4,
    /// Drawing the right eye
    pub right_eye: bool,
}

impl<'a> DrawContext<'a> {
    /// Context for drawing `render_data` with `material` under the given matrices
    pub fn new(
        label: &'a str,
        render_data: &'a RenderData,
        material: &'a Material,
        model: Mat4,
        view: Mat4,
        projection: Mat4,
        right_eye: bool,
    ) -> Self {
        let mv = view * model;
        Self {
            label,
            render_data,
            material,
            model,
            view,
            projection,
            mv,
            mvp: projection * mv,
            right_eye,
        }
    }

    fn draw_call(&self, program: Program) -> Result<DrawCall, RenderDispatchError> {
        let mesh = self.render_data.mesh().ok_or(RenderDispatchError::NoMesh)?;
        Ok(DrawCall {
            program,
            geometry: DrawGeometry::Uploaded(mesh.geometry()),
            mvp: self.mvp,
            right_eye: self.right_eye,
            label: self.label.to_string(),
        })
    }
}

/// A program that can draw a material
pub trait Shader {
    /// Draw one pass; an error makes the renderer fall back to the error shader
    fn render(&self, gpu: &mut dyn GpuContext, context: &DrawContext<'_>) -> Result<(), RenderDispatchError>;
}

/// Builds a shader on first use
pub type ShaderFactory = Box<dyn Fn() -> Box<dyn Shader>>;

/// Built-in shader for the material shader types
#[derive(Debug, Clone)]
pub struct MaterialShader {
    shader_type: ShaderType,
    required: Vec<(&'static str, &'static str)>,
    needs_normal_matrix: bool,
}

impl MaterialShader {
    /// Shader for `shader_type` requiring `(key, kind)` material values
    pub fn new(shader_type: ShaderType, required: &[(&'static str, &'static str)]) -> Self {
        Self {
            shader_type,
            required: required.to_vec(),
            needs_normal_matrix: false,
        }
    }

    /// Builder pattern: the program uploads `inverse(transpose(mv))`
    pub fn with_normal_matrix(mut self) -> Self {
        self.needs_normal_matrix = true;
        self
    }

    /// Built-in configuration for a shader type
    pub fn builtin(shader_type: ShaderType) -> Self {
        const TEXTURE: &[(&str, &str)] = &[("main_texture", "texture")];
        match shader_type {
            ShaderType::UnlitHorizontalStereo
            | ShaderType::UnlitVerticalStereo
            | ShaderType::Oes
            | ShaderType::OesHorizontalStereo
            | ShaderType::OesVerticalStereo
            | ShaderType::Cubemap => Self::new(shader_type, TEXTURE),
            ShaderType::CubemapReflection | ShaderType::Texture => {
                Self::new(shader_type, TEXTURE).with_normal_matrix()
            }
            ShaderType::Assimp => Self::new(shader_type, &[]).with_normal_matrix(),
            ShaderType::ExternalRenderer | ShaderType::Custom(_) => Self::new(shader_type, &[]),
        }
    }
}

impl Shader for MaterialShader {
    fn render(&self, gpu: &mut dyn GpuContext, context: &DrawContext<'_>) -> Result<(), RenderDispatchError> {
        for &(key, kind) in &self.required {
            context.material.expect_kind(key, kind)?;
        }
        if self.needs_normal_matrix && context.mv.try_inverse().is_none() {
            return Err(RenderDispatchError::Shader(format!(
                "{:?}: model-view matrix is not invertible",
                self.shader_type
            )));
        }

        let call = context.draw_call(Program::Material(self.shader_type))?;
        gpu.draw(&call);
        Ok(())
    }
}

/// Fallback drawn in place of an object whose shader failed
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorShader;

impl ErrorShader {
    /// Draw the error indicator; objects without a mesh are skipped
    pub fn render(&self, gpu: &mut dyn GpuContext, context: &DrawContext<'_>) {
        if let Ok(call) = context.draw_call(Program::Error) {
            gpu.draw(&call);
        }
    }
}

/// Flat shader used to draw occlusion proxies
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingBoxShader;

impl BoundingBoxShader {
    /// Draw `call`'s geometry with the bounding-box program
    pub fn render(&self, gpu: &mut dyn GpuContext, call: DrawCall) {
        gpu.draw(&DrawCall {
            program: Program::BoundingBox,
            ..call
        });
    }
}

/// Lazily populated shader registry
pub struct ShaderManager {
    factories: HashMap<ShaderType, ShaderFactory>,
    shaders: HashMap<ShaderType, Box<dyn Shader>>,
    error_shader: ErrorShader,
    bounding_box_shader: BoundingBoxShader,
}

impl ShaderManager {
    /// Registry with factories for every built-in shader type
    pub fn new() -> Self {
        let mut manager = Self::empty();
        for shader_type in [
            ShaderType::UnlitHorizontalStereo,
            ShaderType::UnlitVerticalStereo,
            ShaderType::Oes,
            ShaderType::OesHorizontalStereo,
            ShaderType::OesVerticalStereo,
            ShaderType::Cubemap,
            ShaderType::CubemapReflection,
            ShaderType::Texture,
            ShaderType::ExternalRenderer,
            ShaderType::Assimp,
        ] {
            manager.register(shader_type, move || Box::new(MaterialShader::builtin(shader_type)));
        }
        manager
    }

    /// Registry without any factories
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            shaders: HashMap::new(),
            error_shader: ErrorShader,
            bounding_box_shader: BoundingBoxShader,
        }
    }

    /// Register (or replace) the factory for `shader_type`
    ///
    /// An already built instance is dropped and rebuilt on next use.
    pub fn register(&mut self, shader_type: ShaderType, factory: impl Fn() -> Box<dyn Shader> + 'static) {
        self.shaders.remove(&shader_type);
        self.factories.insert(shader_type, Box::new(factory));
    }

    /// Register an application shader under [`ShaderType::Custom`]
    pub fn register_custom(&mut self, id: u32, factory: impl Fn() -> Box<dyn Shader> + 'static) -> ShaderType {
        let shader_type = ShaderType::Custom(id);
        self.register(shader_type, factory);
        shader_type
    }

    /// Shader for `shader_type`, built on first request
    pub fn shader(&mut self, shader_type: ShaderType) -> Result<&dyn Shader, RenderDispatchError> {
        if !self.shaders.contains_key(&shader_type) {
            let factory = self
                .factories
                .get(&shader_type)
                .ok_or(RenderDispatchError::UnknownShader(shader_type))?;
            log::debug!("Building shader for {shader_type:?}");
            self.shaders.insert(shader_type, factory());
        }
        self.shaders
            .get(&shader_type)
            .map(|shader| &**shader)
            .ok_or(RenderDispatchError::UnknownShader(shader_type))
    }

    /// Number of shaders built so far
    pub fn built_count(&self) -> usize {
        self.shaders.len()
    }

    /// Fallback shader
    pub fn error_shader(&self) -> &ErrorShader {
        &self.error_shader
    }

    /// Occlusion proxy shader
    pub fn bounding_box_shader(&self) -> &BoundingBoxShader {
        &self.bounding_box_shader
    }
}

impl Default for ShaderManager {
    fn default() -> Self {
        Self::new()
    }
}
