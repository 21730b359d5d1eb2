//! Value tree and its serde bridges.

pub mod node;
pub mod parser;

pub use node::{Number, ObjectAdapter, Record, Value};
