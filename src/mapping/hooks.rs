//! User callbacks around each mapping call and each resolved value.

use super::error::MappingError;
use crate::document::node::Value;
use crate::pipeline::Direction;
use std::fmt;
use std::sync::Arc;

/// Where a hook is being invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContext {
    pub direction: Direction,
    /// Concrete dotted path read from (empty for whole-call hooks)
    pub source_path: String,
    /// Concrete dotted path about to be written (empty for whole-call hooks)
    pub target_path: String,
}

impl HookContext {
    pub fn call(direction: Direction) -> Self {
        Self {
            direction,
            source_path: String::new(),
            target_path: String::new(),
        }
    }
}

type NotifyHook = Arc<dyn Fn(&HookContext) + Send + Sync>;
type FinishHook = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;
type ValueHook = Arc<dyn Fn(Value, &HookContext) -> anyhow::Result<Value> + Send + Sync>;
type WriteGuard = Arc<dyn Fn(&Value, &HookContext) -> bool + Send + Sync>;

/// Optional callbacks; every hook defaults to absent.
///
/// # Example
///
/// ```
/// use mapquill::mapping::MappingHooks;
/// use mapquill::document::node::Value;
///
/// let hooks = MappingHooks::new()
///     .pre_transform(|value, _ctx| Ok(value))
///     .before_write(|value, _ctx| !matches!(value, Value::String(s) if s.is_empty()));
/// ```
#[derive(Clone, Default)]
pub struct MappingHooks {
    before_all: Option<NotifyHook>,
    after_all: Option<FinishHook>,
    pre_transform: Option<ValueHook>,
    post_transform: Option<ValueHook>,
    before_write: Option<WriteGuard>,
}

impl MappingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs once before any value is read.
    pub fn before_all(mut self, hook: impl Fn(&HookContext) + Send + Sync + 'static) -> Self {
        self.before_all = Some(Arc::new(hook));
        self
    }

    /// Runs once on the finished output.
    pub fn after_all(mut self, hook: impl Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static) -> Self {
        self.after_all = Some(Arc::new(hook));
        self
    }

    /// Runs on each resolved value before the pipeline.
    pub fn pre_transform(
        mut self,
        hook: impl Fn(Value, &HookContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.pre_transform = Some(Arc::new(hook));
        self
    }

    /// Runs on each resolved value after the pipeline.
    pub fn post_transform(
        mut self,
        hook: impl Fn(Value, &HookContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.post_transform = Some(Arc::new(hook));
        self
    }

    /// Decides whether a value is written; `false` drops it.
    pub fn before_write(mut self, hook: impl Fn(&Value, &HookContext) -> bool + Send + Sync + 'static) -> Self {
        self.before_write = Some(Arc::new(hook));
        self
    }

    pub(crate) fn run_before_all(&self, ctx: &HookContext) {
        if let Some(hook) = &self.before_all {
            hook(ctx);
        }
    }

    pub(crate) fn run_after_all(&self, value: Value) -> Result<Value, MappingError> {
        match &self.after_all {
            Some(hook) => hook(value).map_err(|err| MappingError::hook("after_all", err)),
            None => Ok(value),
        }
    }

    pub(crate) fn run_pre_transform(&self, value: Value, ctx: &HookContext) -> Result<Value, MappingError> {
        match &self.pre_transform {
            Some(hook) => hook(value, ctx).map_err(|err| MappingError::hook("pre_transform", err)),
            None => Ok(value),
        }
    }

    pub(crate) fn run_post_transform(&self, value: Value, ctx: &HookContext) -> Result<Value, MappingError> {
        match &self.post_transform {
            Some(hook) => hook(value, ctx).map_err(|err| MappingError::hook("post_transform", err)),
            None => Ok(value),
        }
    }

    pub(crate) fn allows_write(&self, value: &Value, ctx: &HookContext) -> bool {
        self.before_write.as_ref().map_or(true, |hook| hook(value, ctx))
    }
}

impl fmt::Debug for MappingHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingHooks")
            .field("before_all", &self.before_all.is_some())
            .field("after_all", &self.after_all.is_some())
            .field("pre_transform", &self.pre_transform.is_some())
            .field("post_transform", &self.post_transform.is_some())
            .field("before_write", &self.before_write.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_hooks_pass_through() {
        let hooks = MappingHooks::new();
        let ctx = HookContext::call(Direction::Forward);
        assert_eq!(hooks.run_pre_transform(Value::from(1), &ctx).unwrap(), Value::from(1));
        assert!(hooks.allows_write(&Value::Null, &ctx));
    }

    #[test]
    fn test_hook_error_is_wrapped() {
        let hooks = MappingHooks::new().post_transform(|_, _| anyhow::bail!("boom"));
        let err = hooks
            .run_post_transform(Value::Null, &HookContext::call(Direction::Reverse))
            .unwrap_err();
        assert_eq!(err.to_string(), "Hook 'post_transform' failed: boom");
    }
}
