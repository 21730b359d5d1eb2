//! Repeated-group expansion shared by forward and reverse mapping.
//!
//! Walking a template, every time the output path gains a wildcard that is
//! not yet bound, a group opens: the direction-specific side decides which
//! keys the wildcard takes, and the subtree is walked once per key with the
//! binding extended by one level. Siblings inside the subtree see the same
//! binding, so they advance in lockstep.
//!
//! A group with no keys is handed to the visitor as an empty group, so an
//! existing empty collection on the read side is recreated on the write side.

use super::error::MappingError;
use crate::document::node::Value;
use crate::path::accessor::DataAccessor;
use crate::path::ast::{self, PathExpression, Segment};
use crate::path::binding::{BoundIndex, WildcardBinding};
use crate::path::mutator::DataMutator;
use crate::template::TemplateNode;
use indexmap::IndexMap;
use tracing::debug;

/// Direction-specific half of the walk.
pub(crate) trait GroupVisitor {
    /// Keys for the next wildcard of `target`, in output order.
    fn group_keys(&self, node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Vec<String>;

    /// Handles a group for which `group_keys` found nothing.
    fn empty_group(
        &mut self,
        node: &TemplateNode,
        target: &[Segment],
        binding: &WildcardBinding,
    ) -> Result<(), MappingError>;

    /// Handles a literal or expression at a fully bound output path.
    fn leaf(&mut self, node: &TemplateNode, target: &[Segment], binding: &WildcardBinding) -> Result<(), MappingError>;
}

pub(crate) fn walk<V: GroupVisitor>(
    visitor: &mut V,
    node: &TemplateNode,
    target: &[Segment],
    binding: &WildcardBinding,
) -> Result<(), MappingError> {
    if ast::wildcard_count(target) > binding.depth() {
        let keys = visitor.group_keys(node, target, binding);
        debug!(
            path = %ast::render(target, &[]),
            depth = binding.depth(),
            elements = keys.len(),
            "expanding repeated group"
        );
        if keys.is_empty() {
            return visitor.empty_group(node, target, binding);
        }
        for (position, key) in keys.into_iter().enumerate() {
            let level = BoundIndex {
                source_key: key.clone(),
                target_key: key,
                position,
            };
            walk(visitor, node, target, &binding.push(level))?;
        }
        return Ok(());
    }

    match node {
        TemplateNode::Nested(entries) => {
            for entry in entries {
                let mut path = target.to_vec();
                path.extend(entry.path.segments().iter().cloned());
                walk(visitor, &entry.node, &path, binding)?;
            }
        }
        TemplateNode::List(items) => {
            for (index, item) in items.iter().enumerate() {
                let mut path = target.to_vec();
                path.push(Segment::Key(index.to_string()));
                walk(visitor, item, &path, binding)?;
            }
        }
        leaf => visitor.leaf(leaf, target, binding)?,
    }
    Ok(())
}

/// Keys found at the last wildcard of `prefix`, with earlier wildcards
/// fixed to `bound`.
pub(crate) fn keys_at(accessor: &DataAccessor<'_>, prefix: &[Segment], bound: &[&str]) -> Vec<String> {
    let depth = bound.len();
    accessor
        .expand_bound(prefix, bound)
        .into_iter()
        .filter_map(|found| found.wildcard_keys.get(depth).cloned())
        .collect()
}

/// The first source path in document order with a wildcard at `depth + 1`.
///
/// Decides which source collection stands for an empty group, the same
/// choice in both directions.
pub(crate) fn driver(node: &TemplateNode, depth: usize) -> Option<&PathExpression> {
    let mut found = None;
    node.for_each_expression(&mut |expr| {
        if found.is_none() {
            found = expr
                .paths()
                .map(|path| path.path.as_ref())
                .find(|path| path.wildcard_count() > depth);
        }
    });
    found
}

/// Segments before the `ordinal`-th wildcard (1-based).
pub(crate) fn before_wildcard(segments: &[Segment], ordinal: usize) -> Option<&[Segment]> {
    ast::through_wildcard(segments, ordinal).map(|through| &through[..through.len() - 1])
}

/// A fresh empty container of the same kind, if `value` is an empty map or
/// sequence.
pub(crate) fn empty_like(value: &Value) -> Option<Value> {
    match value {
        Value::Sequence(items) if items.is_empty() => Some(Value::Sequence(Vec::new())),
        Value::Map(map) if map.is_empty() => Some(Value::Map(IndexMap::new())),
        _ => None,
    }
}

/// Writes `value` at `keys` unless a non-null value is already there.
pub(crate) fn fill_missing(output: &mut Value, keys: &[&str], value: Value) {
    let segments: Vec<Segment> = keys.iter().map(|key| Segment::Key((*key).to_string())).collect();
    let occupied = DataAccessor::new(output)
        .resolve_bound(&segments, &[])
        .is_some_and(|found| !found.is_null());
    if !occupied {
        DataMutator::new(output).set_keys(keys, value);
    }
}

/// Keys of `segments` with wildcards taken from `keys` in order, or `None`
/// if there are more wildcards than keys.
pub(crate) fn concrete_keys<'k>(segments: &'k [Segment], keys: &'k [String]) -> Option<Vec<&'k str>> {
    let mut keys = keys.iter();
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Key(key) => Some(key.as_str()),
            Segment::Wildcard => keys.next().map(String::as_str),
        })
        .collect()
}
