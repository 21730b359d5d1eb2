//! Conversions between `Value` and the serde data models.
//!
//! Sources, targets and templates usually arrive as JSON or YAML text. This
//! module turns `serde_json` / `serde_yaml` values into our `Value` tree and
//! back, and implements `Serialize`/`Deserialize` so a `Value` can sit inside
//! any serde-driven structure.
//!
//! # Example
//!
//! ```
//! use mapquill::document::parser::parse_json;
//! use mapquill::document::node::Value;
//!
//! let value = parse_json(r#"{"user": {"name": "Alice"}}"#).unwrap();
//! assert!(value.as_map().is_some());
//! ```

use super::node::{Number, Value};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

/// Parses a JSON document into a `Value`.
///
/// Integers that fit in `i64` stay integers; everything else becomes a float.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON.
pub fn parse_json(json_str: &str) -> Result<Value> {
    let json: JsonValue = serde_json::from_str(json_str).context("Failed to parse JSON")?;
    Ok(Value::from(json))
}

/// Parses a YAML document into a `Value`.
///
/// Non-string mapping keys are rendered to their text form, so `5: a` becomes
/// the key `"5"`.
///
/// # Errors
///
/// Returns an error if the input is not valid YAML.
pub fn parse_yaml(yaml_str: &str) -> Result<Value> {
    let yaml: YamlValue = serde_yaml::from_str(yaml_str).context("Failed to parse YAML")?;
    Ok(Value::from(yaml))
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => Value::Number(json_number(&n)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, child)| (key, Value::from(child)))
                    .collect(),
            ),
        }
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    match n.as_i64() {
        Some(i) => Number::Integer(i),
        None => Number::Float(n.as_f64().unwrap_or(0.0)),
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(Number::Integer(i)) => JsonValue::from(*i),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Sequence(items) => JsonValue::Array(items.iter().map(JsonValue::from).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, child)| (key.clone(), JsonValue::from(child)))
                    .collect(),
            ),
            Value::Object(_) => JsonValue::Object(
                value
                    .children()
                    .into_iter()
                    .map(|(key, child)| (key, JsonValue::from(child.as_ref())))
                    .collect(),
            ),
        }
    }
}

impl From<YamlValue> for Value {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => Value::Null,
            YamlValue::Bool(b) => Value::Boolean(b),
            YamlValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Integer(i)),
                None => Value::Number(Number::Float(n.as_f64().unwrap_or(0.0))),
            },
            YamlValue::String(s) => Value::String(s),
            YamlValue::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            YamlValue::Mapping(mapping) => {
                let mut map = IndexMap::with_capacity(mapping.len());
                for (key, child) in mapping {
                    map.insert(yaml_key(key), Value::from(child));
                }
                Value::Map(map)
            }
            YamlValue::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => Value::from(other).to_text(),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(_) | Value::Object(_) => {
                let children = self.children();
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in &children {
                    map.serialize_entry(key, child.as_ref())?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::Record;

    #[test]
    fn test_parse_json_keeps_key_order() {
        let value = parse_json(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
        let keys: Vec<&String> = value.as_map().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_parse_json_numbers() {
        let value = parse_json(r#"[1, 2.5, -7]"#).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![Value::from(1), Value::from(2.5), Value::from(-7)])
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_json(r#"{"unclosed": "#).is_err());
    }

    #[test]
    fn test_parse_yaml_numeric_keys() {
        let value = parse_yaml("items:\n  5: a\n  10: b\n").unwrap();
        let items = value.child("items").unwrap();
        assert_eq!(items.child("5").as_deref(), Some(&Value::from("a")));
        assert_eq!(items.child("10").as_deref(), Some(&Value::from("b")));
    }

    #[test]
    fn test_object_serializes_as_map() {
        let value = Value::Object(Box::new(Record::new("User").with("id", 7)));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"id":7}"#);
    }

    #[test]
    fn test_json_conversion_is_symmetric() {
        let json = serde_json::json!({"a": [1, {"b": null}], "c": "x"});
        let value = Value::from(json.clone());
        assert_eq!(JsonValue::from(&value), json);
    }

    #[test]
    fn test_deserialize_value() {
        let value: Value = serde_json::from_str(r#"{"flag": true}"#).unwrap();
        assert_eq!(value.child("flag").as_deref(), Some(&Value::from(true)));
    }
}
