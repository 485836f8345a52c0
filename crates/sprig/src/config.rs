//! Renderer configuration.
//!
//! ```json
//! {
//!   "max_quads_per_batch": 20000,
//!   "assets_dir": "assets",
//!   "shader": "shaders/texture.wgsl",
//!   "clear_color": { "r": 0.1, "g": 0.1, "b": 0.1, "a": 1.0 }
//! }
//! ```
//!
//! Every field is optional; missing fields take the defaults above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::Color;

/// Quads per draw call when nothing else is configured.
pub const DEFAULT_MAX_QUADS_PER_BATCH: usize = 20_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Capacity of the shared vertex/index buffers, in quads.
    pub max_quads_per_batch: usize,
    /// Root that `shader` is resolved against.
    pub assets_dir: PathBuf,
    /// Textured-quad shader, relative to `assets_dir`.
    pub shader: PathBuf,
    pub clear_color: Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads_per_batch: DEFAULT_MAX_QUADS_PER_BATCH,
            assets_dir: PathBuf::from("assets"),
            shader: PathBuf::from("shaders/texture.wgsl"),
            clear_color: Color::rgb(0.1, 0.1, 0.1),
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        log::info!("loaded renderer config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_quads_per_batch == 0 {
            return Err(ConfigError::Invalid {
                field: "max_quads_per_batch",
                message: "must be at least 1".into(),
            });
        }
        // Indices are u32 and each quad uses 4 vertices.
        if self.max_quads_per_batch > (u32::MAX / 4) as usize {
            return Err(ConfigError::Invalid {
                field: "max_quads_per_batch",
                message: format!("{} exceeds the u32 index range", self.max_quads_per_batch),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RendererConfig::from_json_str(r#"{ "max_quads_per_batch": 64 }"#).unwrap();
        assert_eq!(config.max_quads_per_batch, 64);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.shader, PathBuf::from("shaders/texture.wgsl"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = RendererConfig::from_json_str(r#"{ "max_quads_per_batch": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_quads_per_batch", .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = RendererConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("sprig-config-{}.json", std::process::id()));
        let config = RendererConfig {
            max_quads_per_batch: 128,
            clear_color: Color::BLUE,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = RendererConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
