//! Configuration structures for the scene, renderer and logging.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// # Scene Configuration
///
/// Defaults applied to every object created in a [`Scene`](crate::scene::Scene)
/// and the initial state of the scene-wide culling toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Consecutive contrary occlusion results needed before an object's
    /// visibility flips
    pub check_frames: i32,
    /// Initial state of frustum culling
    pub frustum_culling: bool,
    /// Initial state of occlusion culling
    pub occlusion_culling: bool,
}

impl SceneConfig {
    /// Create a scene configuration with defaults
    pub fn new() -> Self {
        Self {
            check_frames: 12,
            frustum_culling: false,
            occlusion_culling: false,
        }
    }

    /// Set the hysteresis window
    pub fn with_check_frames(mut self, frames: i32) -> Self {
        self.check_frames = frames;
        self
    }

    /// Enable or disable frustum culling
    pub fn with_frustum_culling(mut self, enabled: bool) -> Self {
        self.frustum_culling = enabled;
        self
    }

    /// Enable or disable occlusion culling
    pub fn with_occlusion_culling(mut self, enabled: bool) -> Self {
        self.occlusion_culling = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_frames < 0 {
            return Err(ConfigError::Invalid(format!(
                "check_frames must not be negative (got {})",
                self.check_frames
            )));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Renderer Configuration
///
/// Per-eye pass settings for [`Renderer`](crate::render::Renderer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Colour the eye buffer is cleared to before drawing
    pub clear_color: [f32; 4],
    /// Log every per-object dispatch failure (the fallback render always happens)
    pub log_dispatch_failures: bool,
}

impl RendererConfig {
    /// Create a renderer configuration with defaults
    pub fn new() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            log_dispatch_failures: true,
        }
    }

    /// Set the clear colour
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(
                "clear_color components must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Logging Configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems. This is the
/// structure applications should load from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Scene defaults
    pub scene: SceneConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.validate()?;
        self.renderer.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
