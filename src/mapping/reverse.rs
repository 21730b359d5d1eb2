//! Reverse mapping: mapped output + template -> reconstructed source.
//!
//! The template is walked exactly as on the forward path, but every
//! expression reads from the mapped data at the template's output path and
//! writes to the path inside `{{ }}`. Repeated groups take their cardinality
//! from the elements actually present in the mapped data.
//!
//! Inversion is lossy in a few documented ways:
//!
//! - static literals have no source and are skipped
//! - expressions with several paths are skipped
//! - defaults and filters are not undone; the mapped value is written back
//! - when several expressions fed the same output path, only the last one in
//!   document order receives the value, since its write is what the output
//!   holds
//!
//! An empty collection in the mapped data becomes an empty collection at the
//! source path that drives the group.

use super::context::{MappingContext, MappingOptions};
use super::engine::MappingEngine;
use super::error::MappingError;
use super::groups::{self, GroupVisitor};
use super::hooks::{HookContext, MappingHooks};
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
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reconstructs source data from mapped output and the template that
/// produced it.
///
/// # Example
///
/// ```
/// use mapquill::document::node::Value;
/// use mapquill::mapping::ReverseMappingEngine;
/// use serde_json::json;
///
/// let template = Value::from(json!({"fullName": "{{ user.profile.name }}", "type": "premium"}));
/// let mapped = Value::from(json!({"fullName": "Alice", "type": "premium"}));
///
/// let original = ReverseMappingEngine::new()
///     .map_value(&mapped, Value::Null, &template)
///     .unwrap();
/// assert_eq!(original, Value::from(json!({"user": {"profile": {"name": "Alice"}}})));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReverseMappingEngine {
    engine: MappingEngine,
}

impl ReverseMappingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a configured forward engine, sharing its settings.
    pub fn from_engine(engine: MappingEngine) -> Self {
        Self { engine }
    }

    pub fn skip_null(self, skip: bool) -> Self {
        Self::from_engine(self.engine.skip_null(skip))
    }

    pub fn reindex_wildcard(self, reindex: bool) -> Self {
        Self::from_engine(self.engine.reindex_wildcard(reindex))
    }

    pub fn with_options(self, options: MappingOptions) -> Self {
        Self::from_engine(self.engine.with_options(options))
    }

    pub fn with_hooks(self, hooks: MappingHooks) -> Self {
        Self::from_engine(self.engine.with_hooks(hooks))
    }

    /// Runs written-back values through `pipeline` using each stage's
    /// `reverse`.
    pub fn pipe(self, pipeline: Pipeline) -> Self {
        Self::from_engine(self.engine.pipe(pipeline))
    }

    pub fn with_cache(self, cache: Arc<PathCache>) -> Self {
        Self::from_engine(self.engine.with_cache(cache))
    }

    pub fn options(&self) -> MappingOptions {
        self.engine.options()
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.engine.pipeline()
    }

    /// Rebuilds source data from `mapped` into `original`.
    ///
    /// # Errors
    ///
    /// Fails when a pipeline stage (with `stop_on_error`) or a hook fails.
    pub fn map(&self, mapped: &Value, original: Value, template: &Template) -> Result<Value, MappingError> {
        self.run(mapped, original, template)
    }

    /// Parses `template` and rebuilds source data from `mapped`.
    pub fn map_value(&self, mapped: &Value, original: Value, template: &Value) -> Result<Value, MappingError> {
        let template = self.engine.parse_template(template)?;
        self.map(mapped, original, &template)
    }

    /// Inverse of [`MappingEngine::auto_map`]: copies every top-level key of
    /// `mapped` back to the same key of `original`.
    pub fn auto_map(&self, mapped: &Value, original: Value) -> Result<Value, MappingError> {
        self.map(mapped, original, &identity_template(mapped))
    }

    /// Inverse of [`MappingEngine::map_from_template`]: returns one
    /// reconstructed root per source name.
    pub fn map_to_targets_from_template(
        &self,
        template: &Template,
        mapped: &Value,
    ) -> Result<IndexMap<String, Value>, MappingError> {
        match self.run(mapped, Value::Map(IndexMap::new()), template)? {
            Value::Map(targets) => Ok(targets),
            _ => Ok(IndexMap::new()),
        }
    }

    fn run(&self, mapped: &Value, original: Value, template: &Template) -> Result<Value, MappingError> {
        let ctx = self.engine.context(Direction::Reverse);
        ctx.hooks.run_before_all(&HookContext::call(Direction::Reverse));
        let accessor = DataAccessor::new(mapped);
        let mut owners = OutputOwners {
            accessor: &accessor,
            owners: HashMap::new(),
        };
        groups::walk(&mut owners, template.root(), &[], &WildcardBinding::new())?;
        let mut pass = ReversePass {
            ctx: &ctx,
            accessor: &accessor,
            owners: owners.owners,
            output: original,
        };
        groups::walk(&mut pass, template.root(), &[], &WildcardBinding::new())?;
        ctx.hooks.run_after_all(pass.output)
    }
}

/// Keys of the next wildcard of `target`, read from the mapped data.
fn mapped_keys(accessor: &DataAccessor<'_>, target: &[Segment], binding: &WildcardBinding) -> Vec<String> {
    let bound: Vec<&str> = binding.source_keys().collect();
    match ast::through_wildcard(target, binding.depth() + 1) {
        Some(prefix) => groups::keys_at(accessor, prefix, &bound),
        None => Vec::new(),
    }
}

/// Records, for every concrete output path, the last template leaf that
/// wrote it on the forward pass.
struct OutputOwners<'a> {
    accessor: &'a DataAccessor<'a>,
    owners: HashMap<String, *const TemplateNode>,
}

impl GroupVisitor for OutputOwners<'_> {
    fn group_keys(&self, _node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Vec<String> {
        mapped_keys(self.accessor, target, binding)
    }

    fn empty_group(&mut self, _: &TemplateNode, _: &[Segment], _: &WildcardBinding) -> Result<(), MappingError> {
        Ok(())
    }

    fn leaf(&mut self, node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Result<(), MappingError> {
        let bound: Vec<&str> = binding.source_keys().collect();
        self.owners.insert(ast::render(target, &bound), node as *const TemplateNode);
        Ok(())
    }
}

struct ReversePass<'a> {
    ctx: &'a MappingContext<'a>,
    accessor: &'a DataAccessor<'a>,
    owners: HashMap<String, *const TemplateNode>,
    output: Value,
}

impl GroupVisitor for ReversePass<'_> {
    fn group_keys(&self, _node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Vec<String> {
        mapped_keys(self.accessor, target, binding)
    }

    /// An empty collection in the mapped data becomes an empty collection
    /// of the same kind under the driving source path.
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
        let (Some(prefix), Some(source)) = (
            groups::before_wildcard(target, depth + 1),
            groups::before_wildcard(driver.segments(), depth + 1),
        ) else {
            return Ok(());
        };
        let bound: Vec<&str> = binding.source_keys().collect();
        let Some(empty) = self
            .accessor
            .resolve_bound(prefix, &bound)
            .and_then(|found| groups::empty_like(&found))
        else {
            return Ok(());
        };

        let target_keys = binding.target_keys(self.ctx.options.reindex_wildcard);
        let Some(keys) = groups::concrete_keys(source, &target_keys) else {
            return Ok(());
        };
        let ctx = self.ctx.hook_context(ast::render(prefix, &bound), keys.join("."));
        if let Some(empty) = self.ctx.admit(empty, &ctx) {
            trace!(path = %keys.join("."), "reverse write of empty group");
            groups::fill_missing(&mut self.output, &keys, empty);
        }
        Ok(())
    }

    fn leaf(&mut self, node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Result<(), MappingError> {
        let TemplateNode::Expression(expr) = node else {
            return Ok(());
        };
        let bound: Vec<&str> = binding.source_keys().collect();
        let output_path = ast::render(target, &bound);
        if self.owners.get(&output_path).is_some_and(|owner| !std::ptr::eq(*owner, node)) {
            debug!(path = %output_path, expression = expr.raw(), "output path owned by a later expression");
            return Ok(());
        }
        let Some(source) = expr.single_path() else {
            debug!(expression = expr.raw(), "skipping multi-path expression on reverse");
            return Ok(());
        };
        if !source.is_invertible() {
            debug!(expression = expr.raw(), "filters are not undone on reverse");
        }

        let mapped = self
            .accessor
            .resolve_bound(target, &bound)
            .map(Cow::into_owned)
            .unwrap_or_default();
        let Some(value) = expr.invert(mapped) else {
            return Ok(());
        };

        let mut keys = binding.target_keys(self.ctx.options.reindex_wildcard);
        let ctx = self.ctx.hook_context(
            output_path,
            ast::render(source.path.segments(), &keys.iter().map(String::as_str).collect::<Vec<_>>()),
        );
        if let Some(value) = self.ctx.transform(value, &ctx)? {
            write_back(&mut self.output, &source.path, &mut keys, value);
        }
        Ok(())
    }
}

/// Writes `value` at `path`, splitting nested sequences across wildcards
/// that the binding does not cover.
fn write_back(output: &mut Value, path: &PathExpression, keys: &mut Vec<String>, value: Value) {
    if path.wildcard_count() <= keys.len() {
        if let Some(concrete) = groups::concrete_keys(path.segments(), keys) {
            trace!(path = %concrete.join("."), "reverse write");
            DataMutator::new(output).set_keys(&concrete, value);
        }
        return;
    }
    if !value.is_container() {
        debug!(path = path.as_str(), "expected a sequence to split across wildcards");
        return;
    }
    if let Some(empty) = groups::empty_like(&value) {
        let prefix = groups::before_wildcard(path.segments(), keys.len() + 1);
        if let Some(concrete) = prefix.and_then(|prefix| groups::concrete_keys(prefix, keys)) {
            trace!(path = %concrete.join("."), "reverse write of empty collection");
            groups::fill_missing(output, &concrete, empty);
        }
        return;
    }
    let children: Vec<(String, Value)> = value
        .children()
        .into_iter()
        .map(|(key, child)| (key, child.into_owned()))
        .collect();
    for (key, child) in children {
        keys.push(key);
        write_back(output, path, keys, child);
        keys.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reverse(mapped: serde_json::Value, template: serde_json::Value) -> Value {
        ReverseMappingEngine::new()
            .map_value(&Value::from(mapped), Value::Null, &Value::from(template))
            .unwrap()
    }

    #[test]
    fn test_group_cardinality_from_mapped_data() {
        let out = reverse(
            json!({"people": [{"n": "a"}, {"n": "b"}, {"n": "c"}]}),
            json!({"people.*": {"n": "{{ users.*.name }}"}}),
        );
        assert_eq!(
            out,
            Value::from(json!({"users": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}))
        );
    }

    #[test]
    fn test_nested_sequence_is_split() {
        let out = reverse(json!({"names": ["a", "b"]}), json!({"names": "{{ users.*.name }}"}));
        assert_eq!(out, Value::from(json!({"users": [{"name": "a"}, {"name": "b"}]})));
    }

    #[test]
    fn test_empty_nested_collection_restored() {
        let out = reverse(
            json!({"o": [{"id": 1, "lines": []}]}),
            json!({"o.*": {"id": "{{ orders.*.id }}", "lines.*": "{{ orders.*.lines.*.sku }}"}}),
        );
        assert_eq!(out, Value::from(json!({"orders": [{"id": 1, "lines": []}]})));
    }

    #[test]
    fn test_empty_collected_sequence_restored() {
        let out = reverse(json!({"names": []}), json!({"names": "{{ users.*.name }}"}));
        assert_eq!(out, Value::from(json!({"users": []})));
    }

    #[test]
    fn test_literal_owning_output_path_blocks_expression() {
        let out = reverse(
            json!({"a": {"b": "lit"}}),
            json!({"a.b": "{{ x }}", "a": {"b": "lit"}}),
        );
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_prefix_is_stripped() {
        let out = reverse(json!({"id": "ID-7"}), json!({"id": "ID-{{ order.id }}"}));
        assert_eq!(out, Value::from(json!({"order": {"id": "7"}})));
    }

    #[test]
    fn test_multi_path_expression_skipped() {
        let out = reverse(
            json!({"full": "Ann Lee", "age": 3}),
            json!({"full": "{{ first }} {{ last }}", "age": "{{ age }}"}),
        );
        assert_eq!(out, Value::from(json!({"age": 3})));
    }

    #[test]
    fn test_missing_mapped_value_writes_null_unless_skipped() {
        let template = Value::from(json!({"a": "{{ x }}"}));
        let mapped = Value::from(json!({}));
        let engine = ReverseMappingEngine::new();
        assert_eq!(
            engine.map_value(&mapped, Value::Null, &template).unwrap(),
            Value::from(json!({"x": null}))
        );
        let out = engine.skip_null(true).map_value(&mapped, Value::Null, &template).unwrap();
        assert_eq!(out, Value::Null);
    }
}
