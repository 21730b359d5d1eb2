//! File I/O for sources, templates and mapped output.
//!
//! This module loads JSON or YAML documents from disk (optionally gzipped) or
//! stdin into `Value` trees, and renders or saves values back with atomic
//! writes.

pub mod loader;
pub mod saver;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Text format of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// Detects the format from a file name, looking through a `.gz` suffix.
    ///
    /// - `data.json` → `Some(Json)`
    /// - `data.yml.gz` → `Some(Yaml)`
    /// - `data.txt` → `None`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().to_string_lossy();
        let base = name.strip_suffix(".gz").unwrap_or(&name);
        if base.ends_with(".json") {
            Some(Format::Json)
        } else if base.ends_with(".yaml") || base.ends_with(".yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

/// Whether `path` names a gzip-compressed file.
pub(crate) fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}
