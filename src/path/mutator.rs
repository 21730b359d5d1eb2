//! Path-addressed writes into an owned root.
//!
//! Missing intermediate levels are created on the way down: a sequence when
//! the next key is `0`, a map otherwise. Writing past the end of a sequence
//! turns it into a map keyed by decimal index so sparse indices survive.

use super::ast::{PathExpression, Segment};
use super::binding::WildcardBinding;
use super::error::PathError;
use crate::document::node::{parse_index, Value};
use indexmap::IndexMap;
use tracing::trace;

/// Path-based writer over a mutably borrowed root.
///
/// # Example
///
/// ```
/// use mapquill::document::node::Value;
/// use mapquill::path::{DataMutator, PathExpression};
///
/// let mut root = Value::Null;
/// DataMutator::new(&mut root)
///     .set(&PathExpression::parse("profile.name").unwrap(), Value::from("Alice"))
///     .unwrap();
/// assert_eq!(
///     root,
///     Value::from(serde_json::json!({"profile": {"name": "Alice"}}))
/// );
/// ```
#[derive(Debug)]
pub struct DataMutator<'a> {
    root: &'a mut Value,
}

impl<'a> DataMutator<'a> {
    pub fn new(root: &'a mut Value) -> Self {
        Self { root }
    }

    /// Writes `value` at a non-wildcard path.
    ///
    /// # Errors
    ///
    /// Returns `PathError::UnboundWildcard` if `expr` contains a wildcard.
    pub fn set(&mut self, expr: &PathExpression, value: Value) -> Result<(), PathError> {
        self.set_bound(expr, &WildcardBinding::new(), value, false)
    }

    /// Writes `value` at `expr` with wildcards replaced by the binding's
    /// target keys, renumbered densely from zero when `reindex` is set.
    ///
    /// # Errors
    ///
    /// Returns `PathError::UnboundWildcard` if `expr` has more wildcards than
    /// the binding has levels.
    pub fn set_bound(
        &mut self,
        expr: &PathExpression,
        binding: &WildcardBinding,
        value: Value,
        reindex: bool,
    ) -> Result<(), PathError> {
        let bound = binding.target_keys(reindex);
        let keys = concrete_keys(expr, &bound)?;
        trace!(path = %keys.join("."), "write");
        write_at(self.root, &keys, value);
        Ok(())
    }

    /// Writes `value` at an already concrete key path.
    pub fn set_keys(&mut self, keys: &[&str], value: Value) {
        write_at(self.root, keys, value);
    }

    /// Removes the value at a non-wildcard path and returns it.
    ///
    /// Removing from the middle of a sequence leaves a gap, so the sequence
    /// becomes a map keyed by the remaining indices.
    pub fn remove(&mut self, expr: &PathExpression) -> Result<Option<Value>, PathError> {
        let keys = concrete_keys(expr, &[])?;
        let Some((leaf, parents)) = keys.split_last() else {
            return Ok(None);
        };

        let mut node = &mut *self.root;
        for key in parents {
            node = match node {
                Value::Map(map) => match map.get_mut(*key) {
                    Some(child) => child,
                    None => return Ok(None),
                },
                Value::Sequence(items) => match parse_index(key).and_then(|i| items.get_mut(i)) {
                    Some(child) => child,
                    None => return Ok(None),
                },
                // Attributes come back by value, so removal below an object
                // has nothing to detach from.
                _ => return Ok(None),
            };
        }

        Ok(remove_child(node, leaf))
    }
}

fn concrete_keys<'e>(expr: &'e PathExpression, bound: &'e [String]) -> Result<Vec<&'e str>, PathError> {
    let mut wildcard = 0;
    expr.segments()
        .iter()
        .map(|segment| match segment {
            Segment::Key(key) => Ok(key.as_str()),
            Segment::Wildcard => {
                let key = bound.get(wildcard).ok_or_else(|| PathError::UnboundWildcard {
                    path: expr.to_string(),
                    position: wildcard,
                })?;
                wildcard += 1;
                Ok(key.as_str())
            }
        })
        .collect()
}

/// Empty container suited to receive `key` as its first child.
fn container_for(key: &str) -> Value {
    if parse_index(key) == Some(0) {
        Value::Sequence(Vec::new())
    } else {
        Value::Map(IndexMap::new())
    }
}

fn sequence_to_map(items: Vec<Value>) -> Value {
    Value::Map(
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
    )
}

fn write_at(node: &mut Value, keys: &[&str], value: Value) {
    let Some((key, rest)) = keys.split_first() else {
        *node = value;
        return;
    };

    let promote = match node {
        Value::Sequence(items) => !matches!(parse_index(key), Some(index) if index <= items.len()),
        Value::Map(_) | Value::Object(_) => false,
        _ => {
            *node = container_for(key);
            false
        }
    };
    if promote {
        let items = match std::mem::take(node) {
            Value::Sequence(items) => items,
            _ => Vec::new(),
        };
        *node = sequence_to_map(items);
    }

    match node {
        Value::Map(map) => {
            let child = map.entry((*key).to_string()).or_insert(Value::Null);
            write_at(child, rest, value);
        }
        Value::Sequence(items) => {
            let index = parse_index(key).unwrap_or(items.len());
            if index == items.len() {
                items.push(Value::Null);
            }
            write_at(&mut items[index], rest, value);
        }
        Value::Object(object) => {
            let mut child = object.get_attribute(key).unwrap_or(Value::Null);
            write_at(&mut child, rest, value);
            object.set_attribute(key, child);
        }
        _ => {}
    }
}

fn remove_child(node: &mut Value, key: &str) -> Option<Value> {
    match node {
        Value::Map(map) => map.shift_remove(key),
        Value::Sequence(items) => {
            let index = parse_index(key).filter(|index| *index < items.len())?;
            if index + 1 == items.len() {
                return items.pop();
            }
            let mut map = match std::mem::take(node) {
                Value::Sequence(items) => sequence_to_map(items),
                other => other,
            };
            let removed = match &mut map {
                Value::Map(entries) => entries.shift_remove(key),
                _ => None,
            };
            *node = map;
            removed
        }
        Value::Object(object) => {
            let previous = object.get_attribute(key)?;
            object.set_attribute(key, Value::Null);
            Some(previous)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::Record;
    use crate::path::binding::BoundIndex;
    use crate::path::parser::Parser;
    use serde_json::json;

    fn set(root: &mut Value, path: &str, value: Value) {
        DataMutator::new(root)
            .set(&Parser::parse(path).unwrap(), value)
            .unwrap();
    }

    #[test]
    fn test_set_creates_maps() {
        let mut root = Value::Null;
        set(&mut root, "a.b.c", Value::from(1));
        assert_eq!(root, Value::from(json!({"a": {"b": {"c": 1}}})));
    }

    #[test]
    fn test_set_creates_sequence_for_index_zero() {
        let mut root = Value::Null;
        set(&mut root, "items.0", Value::from("x"));
        set(&mut root, "items.1", Value::from("y"));
        assert_eq!(root, Value::from(json!({"items": ["x", "y"]})));
    }

    #[test]
    fn test_sparse_index_promotes_to_map() {
        let mut root = Value::Null;
        set(&mut root, "items.0", Value::from("x"));
        set(&mut root, "items.5", Value::from("y"));
        assert_eq!(root, Value::from(json!({"items": {"0": "x", "5": "y"}})));
    }

    #[test]
    fn test_set_overwrites_scalar_with_container() {
        let mut root = Value::from(json!({"a": 1}));
        set(&mut root, "a.b", Value::from(2));
        assert_eq!(root, Value::from(json!({"a": {"b": 2}})));
    }

    #[test]
    fn test_set_unbound_wildcard_fails() {
        let mut root = Value::Null;
        let result = DataMutator::new(&mut root).set(&Parser::parse("a.*").unwrap(), Value::Null);
        assert!(matches!(result, Err(PathError::UnboundWildcard { position: 0, .. })));
    }

    #[test]
    fn test_set_bound_reindexes() {
        let path = Parser::parse("users.*").unwrap();
        let mut root = Value::Null;
        for (position, key) in ["5", "10"].iter().enumerate() {
            let binding = WildcardBinding::new().push(BoundIndex {
                source_key: key.to_string(),
                target_key: key.to_string(),
                position,
            });
            DataMutator::new(&mut root)
                .set_bound(&path, &binding, Value::from(*key), true)
                .unwrap();
        }
        assert_eq!(root, Value::from(json!({"users": ["5", "10"]})));
    }

    #[test]
    fn test_set_through_object() {
        let mut root = Value::Object(Box::new(Record::new("User")));
        set(&mut root, "address.city", Value::from("Oslo"));
        assert_eq!(root.child("address").unwrap().into_owned(), Value::from(json!({"city": "Oslo"})));
    }

    #[test]
    fn test_remove() {
        let mut root = Value::from(json!({"a": {"b": 1, "c": 2}, "list": [1, 2, 3]}));
        let removed = DataMutator::new(&mut root).remove(&Parser::parse("a.b").unwrap()).unwrap();
        assert_eq!(removed, Some(Value::from(1)));
        let removed = DataMutator::new(&mut root).remove(&Parser::parse("list.0").unwrap()).unwrap();
        assert_eq!(removed, Some(Value::from(1)));
        assert_eq!(
            root,
            Value::from(json!({"a": {"c": 2}, "list": {"1": 2, "2": 3}}))
        );
        let missing = DataMutator::new(&mut root).remove(&Parser::parse("x.y").unwrap()).unwrap();
        assert_eq!(missing, None);
    }
}
