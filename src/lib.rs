//! MAPQuill - path-based data access and reversible template mapping.
//!
//! - [`path`] resolves and writes dotted paths (`users.*.name`) in nested data
//! - [`template`] parses mapping templates with `{{ path }}` expressions
//! - [`mapping`] maps data forward through a template and back again
//! - [`pipeline`] transforms each mapped value through ordered stages
//!
//! # Example
//!
//! ```
//! use mapquill::document::node::Value;
//! use mapquill::mapping::MappingEngine;
//! use serde_json::json;
//!
//! let source = Value::from(json!({"users": [{"name": "Ann"}, {"name": "Bo"}]}));
//! let template = Value::from(json!({"names": {"*": "{{ users.*.name }}"}}));
//!
//! let out = MappingEngine::new().map_value(&source, Value::Null, &template).unwrap();
//! assert_eq!(out, Value::from(json!({"names": ["Ann", "Bo"]})));
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod logging;
pub mod mapping;
pub mod path;
pub mod pipeline;
pub mod template;
