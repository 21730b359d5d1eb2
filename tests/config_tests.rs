use mapquill::config::Config;
use mapquill::file::Format;
use mapquill::mapping::context::MappingOptions;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert!(!config.skip_null);
    assert!(!config.reindex_wildcard);
    assert!(config.stop_on_error);
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.output_format, Format::Json);
    assert!(config.pretty);
}

#[test]
fn test_partial_config_fills_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "skip_null = true\noutput_format = \"yaml\"\n").unwrap();

    let config = Config::load_from(temp_file.path()).unwrap();

    assert!(config.skip_null);
    assert_eq!(config.output_format, Format::Yaml);
    // Untouched fields keep their defaults
    assert!(config.stop_on_error);
    assert_eq!(config.log_level, "warn");
    assert!(config.pretty);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config {
        skip_null: true,
        reindex_wildcard: true,
        stop_on_error: false,
        log_level: "debug".to_string(),
        output_format: Format::Yaml,
        pretty: false,
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_invalid_config_is_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "skip_null = \"sometimes\"").unwrap();

    assert!(Config::load_from(temp_file.path()).is_err());
}

#[test]
fn test_mapping_options_follow_config() {
    let config = Config {
        skip_null: true,
        reindex_wildcard: false,
        ..Config::default()
    };

    assert_eq!(
        config.mapping_options(),
        MappingOptions {
            skip_null: true,
            reindex_wildcard: false,
        }
    );
}

#[test]
fn test_config_path_location() {
    if let Some(path) = Config::config_path() {
        assert!(path.ends_with(".config/mapquill/config.toml"));
    }
}
