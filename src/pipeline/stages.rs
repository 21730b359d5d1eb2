//! Stock pipeline stages.

use super::{Stage, TransformError};
use crate::document::node::{Number, Value};
use std::fmt;
use std::sync::Arc;

type StageFn = Arc<dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync>;

/// Coerces loosely typed scalars.
///
/// Applied recursively through maps and sequences. Each rule can be turned
/// off; all are on by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    trim_strings: bool,
    numeric_strings: bool,
    empty_as_null: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            trim_strings: true,
            numeric_strings: true,
            empty_as_null: true,
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip surrounding whitespace from strings.
    pub fn trim_strings(mut self, enabled: bool) -> Self {
        self.trim_strings = enabled;
        self
    }

    /// Turn strings such as `"42"` or `"2.5"` into numbers.
    pub fn numeric_strings(mut self, enabled: bool) -> Self {
        self.numeric_strings = enabled;
        self
    }

    /// Turn empty strings into null.
    pub fn empty_as_null(mut self, enabled: bool) -> Self {
        self.empty_as_null = enabled;
        self
    }

    fn normalize(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => self.normalize_str(s),
            Value::Sequence(items) => Value::Sequence(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(key, child)| (key.clone(), self.normalize(child)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn normalize_str(&self, s: &str) -> Value {
        let text = if self.trim_strings { s.trim() } else { s };
        if self.empty_as_null && text.is_empty() {
            return Value::Null;
        }
        if self.numeric_strings {
            if let Ok(i) = text.parse::<i64>() {
                return Value::Number(Number::Integer(i));
            }
            if let Ok(f) = text.parse::<f64>() {
                if f.is_finite() {
                    return Value::Number(Number::Float(f));
                }
            }
        }
        Value::String(text.to_string())
    }
}

impl Stage for Normalizer {
    fn name(&self) -> &str {
        "normalizer"
    }

    fn process(&self, data: &Value) -> Result<Value, TransformError> {
        Ok(self.normalize(data))
    }
}

/// Reshapes values with a closure, optionally with its inverse.
///
/// Without an inverse the reverse path passes values through unchanged.
#[derive(Clone)]
pub struct Transformer {
    name: String,
    forward: StageFn,
    backward: Option<StageFn>,
}

impl Transformer {
    pub fn new<F>(name: impl Into<String>, forward: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            forward: Arc::new(forward),
            backward: None,
        }
    }

    /// Sets the closure used on the reverse path.
    pub fn with_reverse<F>(mut self, backward: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.backward = Some(Arc::new(backward));
        self
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("name", &self.name)
            .field("reversible", &self.backward.is_some())
            .finish()
    }
}

impl Stage for Transformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, data: &Value) -> Result<Value, TransformError> {
        (self.forward)(data)
    }

    fn reverse(&self, data: &Value) -> Result<Value, TransformError> {
        match &self.backward {
            Some(backward) => backward(data),
            None => Ok(data.clone()),
        }
    }
}

/// Rejects values that fail a predicate.
#[derive(Clone)]
pub struct Validator {
    name: String,
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    message: String,
}

impl Validator {
    pub fn new<F>(name: impl Into<String>, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
            message: message.into(),
        }
    }

    /// Validator that rejects null.
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, |value| !value.is_null(), "value is required")
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

impl Stage for Validator {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, data: &Value) -> Result<Value, TransformError> {
        if (self.predicate)(data) {
            Ok(data.clone())
        } else {
            Err(TransformError::Validation(self.message.clone()))
        }
    }
}

/// Arbitrary closure, applied the same way in both directions.
#[derive(Clone)]
pub struct Callback {
    name: String,
    callback: StageFn,
}

impl Callback {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("name", &self.name).finish()
    }
}

impl Stage for Callback {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, data: &Value) -> Result<Value, TransformError> {
        (self.callback)(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizer_defaults() {
        let normalizer = Normalizer::new();
        let input = Value::from(json!({"age": " 30 ", "ratio": "0.5", "note": "  ", "name": " Ann "}));
        let out = normalizer.process(&input).unwrap();
        assert_eq!(
            out,
            Value::from(json!({"age": 30, "ratio": 0.5, "note": null, "name": "Ann"}))
        );
    }

    #[test]
    fn test_normalizer_rules_can_be_disabled() {
        let normalizer = Normalizer::new().numeric_strings(false).empty_as_null(false);
        assert_eq!(normalizer.process(&Value::from(" 7 ")).unwrap(), Value::from("7"));
        assert_eq!(normalizer.process(&Value::from("")).unwrap(), Value::from(""));
    }

    #[test]
    fn test_transformer_reverse() {
        let cents = Transformer::new("cents", |v| match v {
            Value::Number(n) => Ok(Value::from(n.as_f64() * 100.0)),
            other => Ok(other.clone()),
        })
        .with_reverse(|v| match v {
            Value::Number(n) => Ok(Value::from(n.as_f64() / 100.0)),
            other => Ok(other.clone()),
        });
        assert_eq!(cents.process(&Value::from(1.5)).unwrap(), Value::from(150.0));
        assert_eq!(cents.reverse(&Value::from(150.0)).unwrap(), Value::from(1.5));
    }

    #[test]
    fn test_transformer_without_reverse_passes_through() {
        let upper = Transformer::new("upper", |v| Ok(Value::from(v.to_text().to_uppercase())));
        assert_eq!(upper.reverse(&Value::from("abc")).unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_validator() {
        let positive = Validator::new(
            "positive",
            |v| matches!(v, Value::Number(n) if n.as_f64() > 0.0),
            "must be positive",
        );
        assert!(positive.process(&Value::from(3)).is_ok());
        assert_eq!(
            positive.process(&Value::from(-1)),
            Err(TransformError::Validation("must be positive".to_string()))
        );
        assert!(Validator::required("req").process(&Value::Null).is_err());
    }
}
