//! Rendering and saving values.

use super::{is_gzipped, Format};
use crate::document::node::Value;
use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Renders a value as JSON or YAML text, ending with a newline.
///
/// # Example
///
/// ```
/// use mapquill::document::node::Value;
/// use mapquill::file::Format;
/// use mapquill::file::saver::render_value;
///
/// let value = Value::from(serde_json::json!({"a": 1}));
/// assert_eq!(render_value(&value, Format::Json, false).unwrap(), "{\"a\":1}\n");
/// assert_eq!(render_value(&value, Format::Yaml, true).unwrap(), "a: 1\n");
/// ```
pub fn render_value(value: &Value, format: Format, pretty: bool) -> Result<String> {
    let mut text = match (format, pretty) {
        (Format::Json, true) => serde_json::to_string_pretty(value).context("Failed to render JSON")?,
        (Format::Json, false) => serde_json::to_string(value).context("Failed to render JSON")?,
        (Format::Yaml, _) => serde_yaml::to_string(value).context("Failed to render YAML")?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Saves a value to `path`, gzip-compressing when the name ends in `.gz`.
///
/// # Atomic Write
///
/// The text is written to a temporary file next to the target and then
/// renamed over it, so the target is never left partially written.
pub fn save_value_file<P: AsRef<Path>>(path: P, value: &Value, format: Format) -> Result<()> {
    let path = path.as_ref();
    let text = render_value(value, format, true)?;
    write_file_atomic(path, text.as_bytes(), is_gzipped(path))
}

/// Writes `data` next to `path` under a `.tmp` extension, then renames it
/// into place.
fn write_file_atomic(path: &Path, data: &[u8], compress: bool) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path)
        .with_context(|| format!("Failed to create {}", temp_path.display()))?;

    let file = if compress {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(data).context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?
    } else {
        let mut file = file;
        file.write_all(data).context("Failed to write temp file")?;
        file
    };
    file.sync_all().context("Failed to flush temp file")?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to move temp file over {}", path.display()))
}
