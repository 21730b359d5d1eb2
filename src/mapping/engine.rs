//! Forward mapping: source data + template -> output tree.

use super::context::{MappingContext, MappingOptions};
use super::error::MappingError;
use super::groups::{self, GroupVisitor};
use super::hooks::{HookContext, MappingHooks};
use super::reverse::ReverseMappingEngine;
use crate::document::node::Value;
use crate::path::accessor::DataAccessor;
use crate::path::ast::{self, PathExpression, Segment};
use crate::path::binding::WildcardBinding;
use crate::path::cache::PathCache;
use crate::path::mutator::DataMutator;
use crate::pipeline::{Direction, Pipeline};
use crate::template::{identity_template, Template, TemplateNode};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, trace};

/// Maps source data into an output tree following a template.
///
/// The engine is immutable once configured and can be shared across threads;
/// each call builds its own output.
///
/// # Example
///
/// ```
/// use mapquill::document::node::Value;
/// use mapquill::mapping::MappingEngine;
/// use serde_json::json;
///
/// let source = Value::from(json!({"user": {"profile": {"name": "Alice", "age": 30}}}));
/// let template = Value::from(json!({
///     "fullName": "{{ user.profile.name }}",
///     "years": "{{ user.profile.age }}"
/// }));
///
/// let out = MappingEngine::new().map_value(&source, Value::Null, &template).unwrap();
/// assert_eq!(out, Value::from(json!({"fullName": "Alice", "years": 30})));
/// ```
#[derive(Debug, Clone)]
pub struct MappingEngine {
    options: MappingOptions,
    hooks: MappingHooks,
    pipeline: Option<Arc<Pipeline>>,
    cache: Arc<PathCache>,
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self {
            options: MappingOptions::default(),
            hooks: MappingHooks::default(),
            pipeline: None,
            cache: PathCache::global(),
        }
    }
}

impl MappingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit null results instead of writing them.
    pub fn skip_null(mut self, skip: bool) -> Self {
        self.options.skip_null = skip;
        self
    }

    /// Renumber wildcard indices densely from zero in the output.
    pub fn reindex_wildcard(mut self, reindex: bool) -> Self {
        self.options.reindex_wildcard = reindex;
        self
    }

    pub fn with_options(mut self, options: MappingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hooks(mut self, hooks: MappingHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Runs every resolved value through `pipeline`, between the
    /// `pre_transform` and `post_transform` hooks.
    pub fn pipe(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(Arc::new(pipeline));
        self
    }

    /// Uses `cache` instead of the process-wide path cache.
    pub fn with_cache(mut self, cache: Arc<PathCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> MappingOptions {
        self.options
    }

    pub fn hooks(&self) -> &MappingHooks {
        &self.hooks
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_deref()
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    /// A reverse engine with the same options, hooks, pipeline and cache.
    pub fn reverse(&self) -> ReverseMappingEngine {
        ReverseMappingEngine::from_engine(self.clone())
    }

    /// Parses a template value through this engine's cache.
    pub fn parse_template(&self, raw: &Value) -> Result<Template, MappingError> {
        Template::parse_with(raw, &self.cache)
    }

    /// Maps `source` into `target` following `template`.
    ///
    /// `target` is consumed and returned with the mapped values written in;
    /// pass `Value::Null` to start from nothing. Paths missing from `source`
    /// resolve to null.
    ///
    /// # Errors
    ///
    /// Fails when a pipeline stage (with `stop_on_error`) or a hook fails.
    pub fn map(&self, source: &Value, target: Value, template: &Template) -> Result<Value, MappingError> {
        self.run(DataAccessor::new(source), target, template)
    }

    /// Parses `template` and maps `source` into `target`.
    pub fn map_value(&self, source: &Value, target: Value, template: &Value) -> Result<Value, MappingError> {
        let template = self.parse_template(template)?;
        self.map(source, target, &template)
    }

    /// Copies every top-level key of `source` to the same key of `target`.
    pub fn auto_map(&self, source: &Value, target: Value) -> Result<Value, MappingError> {
        self.map(source, target, &identity_template(source))
    }

    /// Maps several named sources at once. The first segment of each path
    /// picks the source: `user.name` reads `name` from `sources["user"]`.
    pub fn map_from_template(
        &self,
        template: &Template,
        sources: &IndexMap<String, Value>,
    ) -> Result<Value, MappingError> {
        self.run(DataAccessor::named(sources), Value::Map(IndexMap::new()), template)
    }

    pub(crate) fn context(&self, direction: Direction) -> MappingContext<'_> {
        MappingContext {
            direction,
            options: self.options,
            hooks: &self.hooks,
            pipeline: self.pipeline.as_deref(),
        }
    }

    fn run(&self, accessor: DataAccessor<'_>, output: Value, template: &Template) -> Result<Value, MappingError> {
        let ctx = self.context(Direction::Forward);
        self.hooks.run_before_all(&HookContext::call(Direction::Forward));
        let mut pass = ForwardPass {
            ctx: &ctx,
            accessor,
            output,
        };
        groups::walk(&mut pass, template.root(), &[], &WildcardBinding::new())?;
        self.hooks.run_after_all(pass.output)
    }
}

struct ForwardPass<'a> {
    ctx: &'a MappingContext<'a>,
    accessor: DataAccessor<'a>,
    output: Value,
}

impl GroupVisitor for ForwardPass<'_> {
    /// Cardinality comes from the first source path in document order that
    /// has a wildcard at this depth and matches at least one element.
    fn group_keys(&self, node: &TemplateNode, _target: &[Segment], binding: &WildcardBinding) -> Vec<String> {
        let depth = binding.depth();
        let bound: Vec<&str> = binding.source_keys().collect();
        let mut keys = Vec::new();
        node.for_each_expression(&mut |expr| {
            if !keys.is_empty() {
                return;
            }
            for path in expr.paths() {
                if let Some(prefix) = path.path.through_wildcard(depth + 1) {
                    keys = groups::keys_at(&self.accessor, prefix, &bound);
                    if !keys.is_empty() {
                        debug!(driver = path.path.as_str(), depth, "group cardinality");
                        return;
                    }
                }
            }
        });
        keys
    }

    /// An empty collection under the driving source path becomes an empty
    /// collection of the same kind at the group's output path.
    fn empty_group(
        &mut self,
        node: &TemplateNode,
        target: &[Segment],
        binding: &WildcardBinding,
    ) -> Result<(), MappingError> {
        let depth = binding.depth();
        let Some(driver) = groups::driver(node, depth) else {
            return Ok(());
        };
        let (Some(source), Some(prefix)) = (
            groups::before_wildcard(driver.segments(), depth + 1),
            groups::before_wildcard(target, depth + 1),
        ) else {
            return Ok(());
        };
        let bound: Vec<&str> = binding.source_keys().collect();
        let Some(empty) = self
            .accessor
            .resolve_bound(source, &bound)
            .and_then(|found| groups::empty_like(&found))
        else {
            return Ok(());
        };

        let target_keys = binding.target_keys(self.ctx.options.reindex_wildcard);
        let Some(keys) = groups::concrete_keys(prefix, &target_keys) else {
            return Ok(());
        };
        let ctx = self.ctx.hook_context(ast::render(source, &bound), keys.join("."));
        if let Some(empty) = self.ctx.admit(empty, &ctx) {
            trace!(path = %keys.join("."), "forward write of empty group");
            groups::fill_missing(&mut self.output, &keys, empty);
        }
        Ok(())
    }

    fn leaf(&mut self, node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Result<(), MappingError> {
        let target_keys = binding.target_keys(self.ctx.options.reindex_wildcard);
        let Some(keys) = groups::concrete_keys(target, &target_keys) else {
            return Ok(());
        };
        let target_path = keys.join(".");

        let value = match node {
            TemplateNode::Literal(value) => {
                let ctx = self.ctx.hook_context(String::new(), target_path);
                self.ctx.admit(value.clone(), &ctx)
            }
            TemplateNode::Expression(expr) => {
                let bound: Vec<&str> = binding.source_keys().collect();
                let resolved = expr.evaluate(|path| resolve(&self.accessor, path, &bound));
                let source_path = match expr.single_path() {
                    Some(path) => ast::render(path.path.segments(), &bound),
                    None => expr.raw().to_string(),
                };
                let ctx = self.ctx.hook_context(source_path, target_path);
                self.ctx.transform(resolved, &ctx)?
            }
            TemplateNode::Nested(_) | TemplateNode::List(_) => None,
        };

        if let Some(value) = value {
            trace!(path = %keys.join("."), "forward write");
            DataMutator::new(&mut self.output).set_keys(&keys, value);
        }
        Ok(())
    }
}

/// Resolves `path` with its leading wildcards fixed to `bound`.
///
/// Wildcards beyond the binding are collected into nested sequences, one
/// level per wildcard. The collected sequence is a single value: hooks and
/// the pipeline see it whole, not element by element. An empty collection
/// stays an empty container; a missing one is null.
fn resolve(accessor: &DataAccessor<'_>, path: &PathExpression, bound: &[&str]) -> Option<Value> {
    if path.wildcard_count() <= bound.len() {
        return accessor.resolve_bound(path.segments(), bound).map(Cow::into_owned);
    }
    let mut keys: Vec<String> = bound.iter().map(|key| key.to_string()).collect();
    Some(collect_leftover(accessor, path, &mut keys))
}

fn collect_leftover(accessor: &DataAccessor<'_>, path: &PathExpression, keys: &mut Vec<String>) -> Value {
    let next = {
        let bound: Vec<&str> = keys.iter().map(String::as_str).collect();
        match path.through_wildcard(keys.len() + 1) {
            Some(prefix) => {
                let next = groups::keys_at(accessor, prefix, &bound);
                if next.is_empty() {
                    return accessor
                        .resolve_bound(&prefix[..prefix.len() - 1], &bound)
                        .and_then(|found| groups::empty_like(&found))
                        .unwrap_or_default();
                }
                next
            }
            None => {
                return accessor
                    .resolve_bound(path.segments(), &bound)
                    .map(Cow::into_owned)
                    .unwrap_or_default();
            }
        }
    };
    Value::Sequence(
        next.into_iter()
            .map(|key| {
                keys.push(key);
                let value = collect_leftover(accessor, path, keys);
                keys.pop();
                value
            })
            .collect(),
    )
}
