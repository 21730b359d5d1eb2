//! Options and per-call state shared by both mapping directions.

use super::error::MappingError;
use super::hooks::{HookContext, MappingHooks};
use crate::document::node::Value;
use crate::pipeline::{Direction, Pipeline};
use serde::{Deserialize, Serialize};

/// Behaviour switches for a mapping call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOptions {
    /// Omit keys whose resolved value is null instead of writing null
    #[serde(default)]
    pub skip_null: bool,
    /// Renumber wildcard indices densely from zero when writing
    #[serde(default)]
    pub reindex_wildcard: bool,
}

/// State for one `map` invocation. Created per call and dropped with it.
pub(crate) struct MappingContext<'a> {
    pub direction: Direction,
    pub options: MappingOptions,
    pub hooks: &'a MappingHooks,
    pub pipeline: Option<&'a Pipeline>,
}

impl MappingContext<'_> {
    /// Runs hooks and the pipeline over a resolved value.
    ///
    /// Returns `None` when the value should not be written, either because
    /// it is null under `skip_null` or because `before_write` vetoed it.
    pub fn transform(&self, value: Value, ctx: &HookContext) -> Result<Option<Value>, MappingError> {
        let value = self.hooks.run_pre_transform(value, ctx)?;
        let value = match self.pipeline {
            Some(pipeline) => pipeline.process(&value, self.direction)?,
            None => value,
        };
        let value = self.hooks.run_post_transform(value, ctx)?;
        Ok(self.admit(value, ctx))
    }

    /// Applies `skip_null` and `before_write` without transforming.
    pub fn admit(&self, value: Value, ctx: &HookContext) -> Option<Value> {
        if self.options.skip_null && value.is_null() {
            return None;
        }
        self.hooks.allows_write(&value, ctx).then_some(value)
    }

    pub fn hook_context(&self, source_path: String, target_path: String) -> HookContext {
        HookContext {
            direction: self.direction,
            source_path,
            target_path,
        }
    }
}
