//! Untyped value tree consumed and produced by the mapping engine.
//!
//! Every source, target and template in mapquill is a `Value`: a closed set of
//! variants covering maps, sequences, scalars and host objects. Host objects are
//! reached through the [`ObjectAdapter`] capability so the accessor and mutator can
//! treat them like maps without knowing their concrete type.
//!
//! # Example
//!
//! ```
//! use mapquill::document::node::{Number, Value};
//! use indexmap::IndexMap;
//!
//! let mut user = IndexMap::new();
//! user.insert("name".to_string(), Value::from("Alice"));
//! user.insert("age".to_string(), Value::Number(Number::Integer(30)));
//! let root = Value::Map(user);
//!
//! assert!(root.is_container());
//! assert_eq!(root.child("name").as_deref(), Some(&Value::from("Alice")));
//! ```

use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;

/// Numeric scalar, integer or float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }
}

/// Attribute-level access to a host object.
///
/// Objects are treated as maps by the accessor and mutator. `get_attribute`
/// returning `None` means the attribute does not exist, which the accessor
/// reports as not found rather than null.
pub trait ObjectAdapter: fmt::Debug + Send + Sync {
    /// Name used in diagnostics and equality.
    fn type_name(&self) -> &str;

    /// Reads an attribute, or `None` when the object has no such attribute.
    fn get_attribute(&self, name: &str) -> Option<Value>;

    /// Writes an attribute, creating it if needed.
    fn set_attribute(&mut self, name: &str, value: Value);

    /// Attribute names in enumeration order, used for wildcard expansion.
    fn attribute_names(&self) -> Vec<String>;

    fn clone_box(&self) -> Box<dyn ObjectAdapter>;
}

impl Clone for Box<dyn ObjectAdapter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A plain named bag of attributes.
///
/// Useful when a caller wants object semantics (attribute access, a type name in
/// diagnostics) without writing its own adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    attributes: IndexMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }
}

impl ObjectAdapter for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.keys().cloned().collect()
    }

    fn clone_box(&self) -> Box<dyn ObjectAdapter> {
        Box::new(self.clone())
    }
}

/// A node of the data tree.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    /// Ordered key-value pairs
    Map(IndexMap<String, Value>),
    /// Ordered elements addressed by decimal index
    Sequence(Vec<Value>),
    /// Host object reached through its adapter
    Object(Box<dyn ObjectAdapter>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.type_name() == b.type_name()
                    && object_snapshot(a.as_ref()) == object_snapshot(b.as_ref())
            }
            _ => false,
        }
    }
}

fn object_snapshot(object: &dyn ObjectAdapter) -> IndexMap<String, Value> {
    object
        .attribute_names()
        .into_iter()
        .filter_map(|name| object.get_attribute(&name).map(|value| (name, value)))
        .collect()
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for maps, sequences and objects.
    ///
    /// # Example
    ///
    /// ```
    /// use mapquill::document::node::Value;
    ///
    /// assert!(Value::Sequence(vec![]).is_container());
    /// assert!(!Value::from(42).is_container());
    /// ```
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Sequence(_) | Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Number of direct children; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Map(map) => map.len(),
            Value::Sequence(items) => items.len(),
            Value::Object(object) => object.attribute_names().len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a direct child by key.
    ///
    /// Maps match by key, sequences by decimal index, objects through
    /// `get_attribute`. Map and sequence children are borrowed; object
    /// attributes are produced by the adapter and therefore owned.
    pub fn child(&self, key: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Map(map) => map.get(key).map(Cow::Borrowed),
            Value::Sequence(items) => parse_index(key)
                .and_then(|index| items.get(index))
                .map(Cow::Borrowed),
            Value::Object(object) => object.get_attribute(key).map(Cow::Owned),
            _ => None,
        }
    }

    /// Consumes the value and returns the child at `key`.
    pub fn into_child(self, key: &str) -> Option<Value> {
        match self {
            Value::Map(mut map) => map.swap_remove(key),
            Value::Sequence(items) => {
                parse_index(key).and_then(|index| items.into_iter().nth(index))
            }
            Value::Object(object) => object.get_attribute(key),
            _ => None,
        }
    }

    /// Direct children with their keys, in enumeration order.
    pub fn children(&self) -> Vec<(String, Cow<'_, Value>)> {
        match self {
            Value::Map(map) => map
                .iter()
                .map(|(key, child)| (key.clone(), Cow::Borrowed(child)))
                .collect(),
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(index, child)| (index.to_string(), Cow::Borrowed(child)))
                .collect(),
            Value::Object(object) => object
                .attribute_names()
                .into_iter()
                .filter_map(|name| {
                    let value = object.get_attribute(&name)?;
                    Some((name, Cow::Owned(value)))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Renders a value as text for string interpolation.
    ///
    /// Null renders empty, containers render as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => serde_json::Value::from(self).to_string(),
        }
    }
}

/// Parses a canonical decimal sequence index. `"01"` and `"-1"` are not indices.
pub fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(Number::Integer(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
