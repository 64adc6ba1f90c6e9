//! Configuration for hearty-store
//!
//! Centralized configuration with sensible defaults.

use std::env;
use std::path::PathBuf;

/// Main configuration for a store engine instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory holding `store_<id>` and `ha_group_<gid>` children
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: env::temp_dir().join("hearty-store"),
        }
    }
}

impl Config {
    /// Create a builder for custom configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    base_dir: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Set the base directory
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    /// Build the final Config, falling back to defaults for unset fields
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            base_dir: self.base_dir.unwrap_or(defaults.base_dir),
        }
    }
}
