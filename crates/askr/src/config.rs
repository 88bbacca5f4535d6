//! Configuration for the scene and the spatial index.
//!
//! Configs are plain serde structs with sensible defaults. Any of them can be
//! read from or written to JSON through the [`Config`] trait:
//!
//! ```ignore
//! let config = QuadTreeConfig::load_from_file("quadtree.json")?;
//! let tree = QuadTree::<u32>::with_config(bounds, config);
//! ```
//!
//! Missing fields fall back to their defaults, so a file only needs the values
//! it changes.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shared load/save/validate behavior for config structs.
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Check value ranges. Called by every loader.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Parse from a JSON string.
    fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        log::info!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Deepest `max_depth` a config may ask for. An `i32` region is down to unit
/// cells well before this.
pub const MAX_QUADTREE_DEPTH: u32 = 32;

/// Quadtree subdivision limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// A leaf splits once it holds more than this many elements.
    pub leaf_capacity: u32,
    /// Leaves at this depth never split (the root is depth 0).
    pub max_depth: u32,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: 8,
            max_depth: 8,
        }
    }
}

impl Config for QuadTreeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.leaf_capacity == 0 {
            return Err(ConfigError::Invalid(
                "leaf_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_depth > MAX_QUADTREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "max_depth must be at most {MAX_QUADTREE_DEPTH}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

/// Frame stepping for a [`Scene`](crate::scene::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Interval between fixed-update hooks, in seconds.
    pub fixed_timestep_secs: f32,
    /// Upper bound on fixed-update hooks per entity in one frame. Backlog
    /// beyond this is dropped.
    pub max_fixed_steps_per_frame: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fixed_timestep_secs: 1.0 / 60.0,
            max_fixed_steps_per_frame: 1,
        }
    }
}

impl Config for SceneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.fixed_timestep_secs.is_finite() || self.fixed_timestep_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fixed_timestep_secs must be positive, got {}",
                self.fixed_timestep_secs
            )));
        }
        if self.max_fixed_steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "max_fixed_steps_per_frame must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = QuadTreeConfig::from_json_str(r#"{ "max_depth": 3 }"#).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.leaf_capacity, 8);
    }

    #[test]
    fn zero_leaf_capacity_is_rejected() {
        let err = QuadTreeConfig::from_json_str(r#"{ "leaf_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn excessive_max_depth_is_rejected() {
        let err = QuadTreeConfig::from_json_str(r#"{ "max_depth": 1000 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(QuadTreeConfig::from_json_str(r#"{ "max_depth": 32 }"#).is_ok());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SceneConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn non_positive_timestep_is_rejected() {
        let err = SceneConfig::from_json_str(r#"{ "fixed_timestep_secs": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("askr_scene_config_{}.json", std::process::id()));
        let config = SceneConfig {
            fixed_timestep_secs: 0.02,
            max_fixed_steps_per_frame: 4,
        };
        config.save_to_file(&path).unwrap();
        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneConfig::load_from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
