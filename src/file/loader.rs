//! Document loading.
//!
//! This module provides functions to load JSON or YAML documents from files
//! or stdin, parsing them into `Value` trees ready for mapping.

use super::{is_gzipped, Format};
use crate::document::node::Value;
use crate::document::parser::{parse_json, parse_yaml};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads and parses a JSON or YAML file.
///
/// The format comes from the extension (`.json`, `.yaml`, `.yml`, each
/// optionally followed by `.gz`). Other names are tried as JSON, then YAML.
///
/// # Examples
///
/// ```no_run
/// use mapquill::file::loader::load_value_file;
///
/// let template = load_value_file("template.yaml").unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read or decompressed
/// - The contents are not valid in the detected format
pub fn load_value_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = decode(bytes, is_gzipped(path))
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    match Format::from_path(path) {
        Some(format) => parse_value_str(&content, format)
            .with_context(|| format!("Failed to parse {}", path.display())),
        None => parse_any(&content).with_context(|| format!("Failed to parse {}", path.display())),
    }
}

/// Parses document text in the given format.
pub fn parse_value_str(content: &str, format: Format) -> Result<Value> {
    match format {
        Format::Json => parse_json(content),
        Format::Yaml => parse_yaml(content),
    }
}

/// Loads a document from stdin, accepting gzip-compressed input.
///
/// JSON is tried first, then YAML.
///
/// # Errors
///
/// This function will return an error if:
/// - Reading from stdin fails
/// - The input is neither valid JSON nor valid YAML
pub fn load_value_from_stdin() -> Result<Value> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = decode(buffer, false).context("Failed to decode stdin")?;
    parse_any(&content).context("Failed to parse stdin: input is neither valid JSON nor valid YAML")
}

fn parse_any(content: &str) -> Result<Value> {
    parse_json(content).or_else(|_| parse_yaml(content))
}

/// Turns raw bytes into text, gunzipping when `compressed` is set or the
/// gzip magic bytes (0x1f 0x8b) lead the buffer.
fn decode(bytes: Vec<u8>, compressed: bool) -> Result<String> {
    if !compressed && !bytes.starts_with(&GZIP_MAGIC) {
        return String::from_utf8(bytes).context("Input is not valid UTF-8");
    }
    let mut content = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut content)
        .context("Failed to decompress gzip data - input may be corrupted")?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_any_falls_back_to_yaml() {
        let value = parse_any("name: Alice\nage: 30\n").unwrap();
        assert_eq!(value.child("age").as_deref(), Some(&Value::from(30)));
    }

    #[test]
    fn test_decode_detects_gzip_magic() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"a\": 1}").unwrap();
        let packed = encoder.finish().unwrap();

        assert_eq!(decode(packed, false).unwrap(), "{\"a\": 1}");
        assert_eq!(decode(b"plain".to_vec(), false).unwrap(), "plain");
        assert!(decode(b"plain".to_vec(), true).is_err());
    }

    #[test]
    fn test_parse_value_str_respects_format() {
        assert!(parse_value_str("a: 1", Format::Json).is_err());
        assert!(parse_value_str("a: 1", Format::Yaml).is_ok());
    }
}
