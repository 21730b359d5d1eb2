//! Configuration system for mapquill.
//!
//! This module provides the configuration structure for mapquill with sensible defaults
//! and support for serialization/deserialization via serde. Configuration is loaded
//! from `~/.config/mapquill/config.toml` and merged with command-line arguments.
//!
//! # Example
//!
//! ```
//! use mapquill::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert!(!config.skip_null);
//! assert_eq!(config.log_level, "warn");
//!
//! // Create custom configuration
//! let custom = Config {
//!     skip_null: true,
//!     ..Config::default()
//! };
//! assert!(custom.mapping_options().skip_null);
//! ```

use crate::file::Format;
use crate::mapping::MappingOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the mapquill command line tool.
///
/// # Fields
///
/// * `skip_null` - Omit null results from mapped output (default: false)
/// * `reindex_wildcard` - Renumber wildcard indices from zero (default: false)
/// * `stop_on_error` - Abort on the first failing pipeline stage (default: true)
/// * `log_level` - Tracing level when `RUST_LOG` is unset (default: "warn")
/// * `output_format` - Format for printed results (default: json)
/// * `pretty` - Pretty-print output (default: true)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Omit null results instead of writing them
    #[serde(default)]
    pub skip_null: bool,

    /// Renumber wildcard indices densely from zero
    #[serde(default)]
    pub reindex_wildcard: bool,

    /// Abort on the first failing pipeline stage
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,

    /// Tracing level: "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Format for printed results
    #[serde(default)]
    pub output_format: Format,

    /// Pretty-print output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_stop_on_error() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip_null: false,
            reindex_wildcard: false,
            stop_on_error: default_stop_on_error(),
            log_level: default_log_level(),
            output_format: Format::default(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/mapquill/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("mapquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Loads configuration from an explicit file.
    ///
    /// Missing keys take their defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(config_path)
    }

    /// Saves configuration to an explicit file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Mapping switches carried by this configuration.
    pub fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            skip_null: self.skip_null,
            reindex_wildcard: self.reindex_wildcard,
        }
    }
}
