//! Mapping templates.
//!
//! A template is a nested value whose shape mirrors the desired output. Map
//! keys are output paths (`"profile.name"`, `"*"`), string leaves holding
//! `{{ }}` are expressions, and every other leaf is a static literal.

pub mod expression;
pub mod filters;
pub mod node;

pub use expression::{Part, PathRef, TemplateExpression};
pub use filters::Filter;
pub use node::{identity_template, Template, TemplateEntry, TemplateNode};
