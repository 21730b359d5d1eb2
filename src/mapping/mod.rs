//! Template-driven mapping in both directions.
//!
//! [`MappingEngine`] resolves each template expression against the source
//! and writes the result at the template's output path.
//! [`ReverseMappingEngine`] walks the same template with the roles swapped.
//!
//! # Round trip
//!
//! ```
//! use mapquill::document::node::Value;
//! use mapquill::mapping::MappingEngine;
//! use serde_json::json;
//!
//! let engine = MappingEngine::new();
//! let template = engine
//!     .parse_template(&Value::from(json!({
//!         "people.*": {"n": "{{ users.*.name }}", "a": "{{ users.*.age }}"}
//!     })))
//!     .unwrap();
//! let source = Value::from(json!({"users": [{"name": "Ann", "age": 3}, {"name": "Bo", "age": 5}]}));
//!
//! let mapped = engine.map(&source, Value::Null, &template).unwrap();
//! let restored = engine.reverse().map(&mapped, Value::Null, &template).unwrap();
//! assert_eq!(restored, source);
//! ```

pub mod context;
pub mod engine;
pub mod error;
mod groups;
pub mod hooks;
pub mod reverse;

pub use context::MappingOptions;
pub use engine::MappingEngine;
pub use error::MappingError;
pub use hooks::{HookContext, MappingHooks};
pub use reverse::ReverseMappingEngine;
