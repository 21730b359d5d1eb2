//! Errors surfaced by `map` and reverse `map` calls.

use crate::path::error::PathError;
use crate::pipeline::TransformError;
use thiserror::Error;

/// A mapping call either returns a complete tree or one of these.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A path inside a template (or a template key) is malformed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A `{{ }}` expression could not be parsed.
    #[error("Invalid template expression '{expression}': {reason}")]
    InvalidTemplate { expression: String, reason: String },

    /// A pipeline stage failed while `stop_on_error` was set.
    #[error("Pipeline stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: TransformError,
    },

    /// A user hook returned an error.
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl MappingError {
    pub(crate) fn template(expression: &str, reason: impl Into<String>) -> Self {
        MappingError::InvalidTemplate {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn hook(hook: &'static str, err: anyhow::Error) -> Self {
        MappingError::Hook {
            hook,
            message: format!("{err:#}"),
        }
    }
}
