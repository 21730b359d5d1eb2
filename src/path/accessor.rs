//! Read access to nested values by path expression.
//!
//! Paths without wildcards take a direct walk that only borrows from the
//! root. Paths with wildcards are expanded into every concrete path they
//! match, keyed by the dotted concrete path (`users.0.name`) so callers can
//! line sibling expressions up by prefix.

use super::ast::{PathExpression, Segment};
use crate::document::node::Value;
use indexmap::IndexMap;
use std::borrow::Cow;

/// Result of resolving a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// Non-wildcard path; `None` when any segment was not found
    Single(Option<Cow<'a, Value>>),
    /// Wildcard path; concrete path to value, empty when nothing matched
    Expanded(IndexMap<String, Value>),
}

/// One concrete match produced by wildcard expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    /// Concrete keys from the root to the matched value
    pub path: Vec<String>,
    /// Keys taken at each wildcard position, outermost first
    pub wildcard_keys: Vec<String>,
    pub value: Cow<'a, Value>,
}

impl Match<'_> {
    pub fn concrete_path(&self) -> String {
        self.path.join(".")
    }
}

#[derive(Debug, Clone, Copy)]
enum Root<'a> {
    Value(&'a Value),
    Named(&'a IndexMap<String, Value>),
}

/// Position reached while walking: either the named-source table or a value.
enum Cursor<'a> {
    Named(&'a IndexMap<String, Value>),
    Node(Cow<'a, Value>),
}

impl<'a> Cursor<'a> {
    fn step(self, key: &str) -> Option<Cow<'a, Value>> {
        match self {
            Cursor::Named(sources) => sources.get(key).map(Cow::Borrowed),
            Cursor::Node(Cow::Borrowed(value)) => value.child(key),
            Cursor::Node(Cow::Owned(value)) => value.into_child(key).map(Cow::Owned),
        }
    }

    fn children(self) -> Vec<(String, Cow<'a, Value>)> {
        match self {
            Cursor::Named(sources) => sources
                .iter()
                .map(|(name, value)| (name.clone(), Cow::Borrowed(value)))
                .collect(),
            Cursor::Node(Cow::Borrowed(value)) => value.children(),
            Cursor::Node(Cow::Owned(value)) => owned_children(value),
        }
    }

    fn into_value(self) -> Cow<'a, Value> {
        match self {
            Cursor::Named(sources) => Cow::Owned(Value::Map(sources.clone())),
            Cursor::Node(value) => value,
        }
    }
}

fn owned_children(value: Value) -> Vec<(String, Cow<'static, Value>)> {
    match value {
        Value::Map(map) => map
            .into_iter()
            .map(|(key, child)| (key, Cow::Owned(child)))
            .collect(),
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, child)| (index.to_string(), Cow::Owned(child)))
            .collect(),
        Value::Object(object) => object
            .attribute_names()
            .into_iter()
            .filter_map(|name| {
                let child = object.get_attribute(&name)?;
                Some((name, Cow::Owned(child)))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Path-based reader over a borrowed root.
///
/// # Example
///
/// ```
/// use mapquill::document::node::Value;
/// use mapquill::path::{DataAccessor, PathExpression};
///
/// let root = Value::from(serde_json::json!({"users": [{"name": "Ann"}, {"name": "Bo"}]}));
/// let accessor = DataAccessor::new(&root);
///
/// let first = PathExpression::parse("users.0.name").unwrap();
/// assert_eq!(accessor.value(&first).as_deref(), Some(&Value::from("Ann")));
///
/// let all = PathExpression::parse("users.*.name").unwrap();
/// let names = accessor.expand(&all);
/// assert_eq!(names.get("users.1.name"), Some(&Value::from("Bo")));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DataAccessor<'a> {
    root: Root<'a>,
}

impl<'a> DataAccessor<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root: Root::Value(root),
        }
    }

    /// Reader over several named roots; the first path segment picks the root.
    pub fn named(sources: &'a IndexMap<String, Value>) -> Self {
        Self {
            root: Root::Named(sources),
        }
    }

    fn cursor(&self) -> Cursor<'a> {
        match self.root {
            Root::Value(value) => Cursor::Node(Cow::Borrowed(value)),
            Root::Named(sources) => Cursor::Named(sources),
        }
    }

    /// Resolves `expr`, expanding wildcards when present.
    pub fn get(&self, expr: &PathExpression) -> Resolved<'a> {
        if expr.has_wildcard() {
            Resolved::Expanded(self.expand(expr))
        } else {
            Resolved::Single(self.value(expr))
        }
    }

    /// Direct lookup for a non-wildcard path.
    ///
    /// Returns `None` when a segment is missing or the path contains a
    /// wildcard. Borrows from the root unless an object adapter had to
    /// produce the value.
    pub fn value(&self, expr: &PathExpression) -> Option<Cow<'a, Value>> {
        if expr.has_wildcard() {
            return None;
        }
        self.resolve_bound(expr.segments(), &[])
    }

    /// Like [`get`](Self::get) but with a fallback for the non-wildcard case.
    ///
    /// A wildcard path returns its expansion as a map, empty when nothing
    /// matched.
    pub fn get_default(&self, expr: &PathExpression, default: Value) -> Value {
        match self.get(expr) {
            Resolved::Single(Some(value)) => value.into_owned(),
            Resolved::Single(None) => default,
            Resolved::Expanded(matches) => Value::Map(matches),
        }
    }

    /// Expands every wildcard in `expr`, keyed by concrete dotted path.
    pub fn expand(&self, expr: &PathExpression) -> IndexMap<String, Value> {
        self.expand_bound(expr.segments(), &[])
            .into_iter()
            .map(|found| (found.concrete_path(), found.value.into_owned()))
            .collect()
    }

    /// Walks `segments`, taking wildcard keys from `bound` in order.
    ///
    /// Returns `None` if a segment is missing or a wildcard has no bound key.
    pub fn resolve_bound(&self, segments: &[Segment], bound: &[&str]) -> Option<Cow<'a, Value>> {
        let mut cursor = self.cursor();
        let mut wildcard = 0;
        for segment in segments {
            let key = match segment {
                Segment::Key(key) => key.as_str(),
                Segment::Wildcard => {
                    let key = *bound.get(wildcard)?;
                    wildcard += 1;
                    key
                }
            };
            cursor = Cursor::Node(cursor.step(key)?);
        }
        Some(cursor.into_value())
    }

    /// Expands `segments`, using `bound` for the leading wildcards and
    /// enumerating children for the rest. Matches come back in document order.
    pub fn expand_bound(&self, segments: &[Segment], bound: &[&str]) -> Vec<Match<'a>> {
        let mut out = Vec::new();
        let mut path = Vec::with_capacity(segments.len());
        let mut keys = Vec::new();
        expand_into(
            self.cursor(),
            segments,
            bound,
            &mut path,
            &mut keys,
            &mut out,
        );
        out
    }
}

fn expand_into<'a>(
    cursor: Cursor<'a>,
    segments: &[Segment],
    bound: &[&str],
    path: &mut Vec<String>,
    keys: &mut Vec<String>,
    out: &mut Vec<Match<'a>>,
) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(Match {
            path: path.clone(),
            wildcard_keys: keys.clone(),
            value: cursor.into_value(),
        });
        return;
    };

    match head {
        Segment::Key(key) => {
            if let Some(child) = cursor.step(key) {
                path.push(key.clone());
                expand_into(Cursor::Node(child), rest, bound, path, keys, out);
                path.pop();
            }
        }
        Segment::Wildcard => {
            if let Some((key, remaining)) = bound.split_first() {
                if let Some(child) = cursor.step(key) {
                    path.push(key.to_string());
                    keys.push(key.to_string());
                    expand_into(Cursor::Node(child), rest, remaining, path, keys, out);
                    keys.pop();
                    path.pop();
                }
            } else {
                for (key, child) in cursor.children() {
                    path.push(key.clone());
                    keys.push(key);
                    expand_into(Cursor::Node(child), rest, &[], path, keys, out);
                    keys.pop();
                    path.pop();
                }
            }
        }
    }
}
