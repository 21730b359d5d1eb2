//! Error types for path parsing and path-addressed writes.

use thiserror::Error;

/// Errors that can occur while parsing or applying a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string is malformed.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    /// A write needed a concrete index for a wildcard and none was bound.
    #[error("Path '{path}' has wildcard #{position} with no bound index")]
    UnboundWildcard { path: String, position: usize },
}

impl PathError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        PathError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
