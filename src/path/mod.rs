//! Dotted path expressions over nested values.
//!
//! # Syntax
//!
//! - `user.name` - Map key or object attribute
//! - `users.0` - Sequence index (decimal, no leading zeros)
//! - `users.*.name` - Every child at that level (wildcard)
//!
//! Reads go through [`DataAccessor`], writes through [`DataMutator`]. Parsed
//! expressions are interned in a [`PathCache`].
//!
//! # Examples
//!
//! ```
//! use mapquill::path::PathExpression;
//!
//! let path = PathExpression::parse("users.*.name").unwrap();
//! assert!(path.has_wildcard());
//! assert_eq!(path.len(), 3);
//! ```

pub mod accessor;
pub mod ast;
pub mod binding;
pub mod cache;
pub mod error;
pub mod mutator;
pub mod parser;

pub use accessor::{DataAccessor, Match, Resolved};
pub use ast::{PathExpression, Segment};
pub use binding::{BoundIndex, WildcardBinding};
pub use cache::PathCache;
pub use error::PathError;
pub use mutator::DataMutator;
pub use parser::Parser;
