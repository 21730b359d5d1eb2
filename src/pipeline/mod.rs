//! Ordered value transformation stages.
//!
//! A [`Pipeline`] runs its stages strictly in registration order, feeding each
//! stage the previous stage's output. Every run records a per-stage outcome
//! in the pipeline context, which stays available until cleared.
//!
//! # Example
//!
//! ```
//! use mapquill::document::node::Value;
//! use mapquill::pipeline::{Direction, Pipeline};
//! use mapquill::pipeline::stages::{Normalizer, Transformer};
//!
//! let pipeline = Pipeline::new()
//!     .stage(Normalizer::new())
//!     .stage(Transformer::new("shout", |value| {
//!         Ok(Value::from(value.to_text().to_uppercase()))
//!     }));
//!
//! let out = pipeline.process(&Value::from("  alice "), Direction::Forward).unwrap();
//! assert_eq!(out, Value::from("ALICE"));
//! ```

pub mod stages;

use crate::document::node::Value;
use crate::mapping::error::MappingError;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{trace, warn};

/// Which way data is flowing through a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source to target
    Forward,
    /// Mapped output back to source
    Reverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

/// Errors raised by a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The stage could not produce a value.
    #[error("{0}")]
    Failed(String),
    /// The value was rejected by a validator.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// One step of a pipeline.
pub trait Stage: Send + Sync {
    /// Name recorded in the pipeline context.
    fn name(&self) -> &str;

    /// Transforms a value on the forward path.
    fn process(&self, data: &Value) -> Result<Value, TransformError>;

    /// Transforms a value on the reverse path. Defaults to [`process`](Self::process).
    fn reverse(&self, data: &Value) -> Result<Value, TransformError> {
        self.process(data)
    }
}

/// Whether a stage succeeded during its most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Success,
    Error,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Success => write!(f, "success"),
            StageStatus::Error => write!(f, "error"),
        }
    }
}

/// Context entry recorded for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub status: StageStatus,
    pub direction: Direction,
    /// Error text when `status` is `Error`
    pub message: Option<String>,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }
}

/// Ordered list of stages with an outcome log.
///
/// With `stop_on_error` (the default) the first failing stage aborts the run
/// and its error is returned. Without it the failure is recorded, logged, and
/// the next stage receives the last successfully produced value.
///
/// The outcome log belongs to the pipeline, not to a run. An engine shares
/// one pipeline across all of its calls, so calls running at the same time
/// record into the same log.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    stop_on_error: bool,
    context: Mutex<IndexMap<String, StageOutcome>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            stop_on_error: true,
            context: Mutex::new(IndexMap::new()),
        }
    }
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            stop_on_error: self.stop_on_error,
            context: Mutex::new(self.context()),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("stop_on_error", &self.stop_on_error)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared stage.
    pub fn shared_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage over `data` in registration order.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::Stage` for the first failing stage when
    /// `stop_on_error` is set.
    pub fn process(&self, data: &Value, direction: Direction) -> Result<Value, MappingError> {
        let mut current = data.clone();
        for stage in &self.stages {
            let result = match direction {
                Direction::Forward => stage.process(&current),
                Direction::Reverse => stage.reverse(&current),
            };
            match result {
                Ok(next) => {
                    trace!(stage = stage.name(), %direction, "stage ok");
                    self.record(stage.name(), direction, StageStatus::Success, None);
                    current = next;
                }
                Err(err) => {
                    self.record(stage.name(), direction, StageStatus::Error, Some(err.to_string()));
                    if self.stop_on_error {
                        return Err(MappingError::Stage {
                            stage: stage.name().to_string(),
                            source: err,
                        });
                    }
                    warn!(stage = stage.name(), %direction, error = %err, "stage failed, continuing");
                }
            }
        }
        Ok(current)
    }

    /// Snapshot of the recorded outcomes, keyed by stage name.
    ///
    /// Each stage keeps only its latest outcome, from whichever run touched
    /// it last. When several threads map through the same engine the
    /// snapshot mixes their runs; call [`Pipeline::clear_context`] between
    /// runs, or give each thread its own engine, to read one run in
    /// isolation.
    pub fn context(&self) -> IndexMap<String, StageOutcome> {
        self.lock().clone()
    }

    pub fn clear_context(&self) {
        self.lock().clear();
    }

    fn record(&self, stage: &str, direction: Direction, status: StageStatus, message: Option<String>) {
        self.lock().insert(
            stage.to_string(),
            StageOutcome {
                status,
                direction,
                message,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<String, StageOutcome>> {
        // A panic while holding the lock leaves only a partial log behind.
        self.context.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::stages::{Callback, Validator};
    use super::*;

    fn append(name: &'static str) -> Callback {
        Callback::new(name, move |value| {
            Ok(Value::from(format!("{}{}", value.to_text(), name)))
        })
    }

    #[test]
    fn test_context_keeps_latest_outcome_per_stage() {
        let pipeline = Pipeline::new()
            .stage(Validator::required("required"))
            .stop_on_error(false);
        pipeline.process(&Value::Null, Direction::Forward).unwrap();
        assert_eq!(pipeline.context()["required"].status, StageStatus::Error);

        pipeline.process(&Value::from(1), Direction::Reverse).unwrap();
        let outcome = &pipeline.context()["required"];
        assert!(outcome.is_success());
        assert_eq!(outcome.direction, Direction::Reverse);

        pipeline.clear_context();
        assert!(pipeline.context().is_empty());
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::new().stage(append("a")).stage(append("b"));
        let out = pipeline.process(&Value::from(">"), Direction::Forward).unwrap();
        assert_eq!(out, Value::from(">ab"));
        assert_eq!(pipeline.stage_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_stop_on_error_aborts() {
        let pipeline = Pipeline::new()
            .stage(Validator::new("non_empty", |v| !v.is_null(), "value required"))
            .stage(append("b"));
        let err = pipeline.process(&Value::Null, Direction::Forward).unwrap_err();
        assert!(matches!(err, MappingError::Stage { ref stage, .. } if stage == "non_empty"));
        let context = pipeline.context();
        assert_eq!(context.len(), 1);
        assert_eq!(context["non_empty"].status, StageStatus::Error);
    }

    #[test]
    fn test_continue_after_error_uses_last_good_value() {
        let pipeline = Pipeline::new()
            .stage(Validator::new("fails", |_| false, "nope"))
            .stage(append("b"))
            .stop_on_error(false);
        let out = pipeline.process(&Value::from("x"), Direction::Forward).unwrap();
        assert_eq!(out, Value::from("xb"));
        let context = pipeline.context();
        assert_eq!(context["fails"].status, StageStatus::Error);
        assert_eq!(context["fails"].message.as_deref(), Some("validation failed: nope"));
        assert!(context["b"].is_success());
    }

    #[test]
    fn test_clear_context() {
        let pipeline = Pipeline::new().stage(append("a"));
        pipeline.process(&Value::from(""), Direction::Reverse).unwrap();
        assert_eq!(pipeline.context()["a"].direction, Direction::Reverse);
        pipeline.clear_context();
        assert!(pipeline.context().is_empty());
    }
}
