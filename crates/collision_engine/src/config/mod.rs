//! Configuration system

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match format {
            ConfigFormat::Toml => Self::from_toml_str(&contents),
            ConfigFormat::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => self.to_toml_string()?,
            ConfigFormat::Ron => self.to_ron_string()?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to a TOML document
    fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Serialize to a RON document
    fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Configuration for octree construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum subdivision depth (root is level 0)
    pub max_depth: u32,

    /// A node subdivides once more than this many entities overlap it
    pub ideal_entity_count: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            ideal_entity_count: 5,
        }
    }
}

impl Config for OctreeConfig {}

/// Configuration for the collision system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Octree parameters used by the broad phase
    pub octree: OctreeConfig,

    /// When false every pair of volumes is tested (no spatial partition)
    pub use_octree: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            octree: OctreeConfig::default(),
            use_octree: true,
        }
    }
}

impl Config for CollisionConfig {}
