//! Named value filters usable inside `{{ path | filter }}`.

use crate::document::node::Value;
use std::fmt;
use std::str::FromStr;

/// A value filter applied after path resolution on the forward path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Trim,
    Upper,
    Lower,
    /// Uppercase the first character
    Ucfirst,
    /// Number of children, `0` for null and `1` for other scalars
    Count,
    First,
    Last,
    /// Map keys (or sequence indices) as a sequence
    Keys,
    /// Map values as a sequence
    Values,
    /// Compact JSON text of the value
    Json,
}

impl Filter {
    pub const ALL: [Filter; 10] = [
        Filter::Trim,
        Filter::Upper,
        Filter::Lower,
        Filter::Ucfirst,
        Filter::Count,
        Filter::First,
        Filter::Last,
        Filter::Keys,
        Filter::Values,
        Filter::Json,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Filter::Trim => "trim",
            Filter::Upper => "upper",
            Filter::Lower => "lower",
            Filter::Ucfirst => "ucfirst",
            Filter::Count => "count",
            Filter::First => "first",
            Filter::Last => "last",
            Filter::Keys => "keys",
            Filter::Values => "values",
            Filter::Json => "json",
        }
    }

    /// Applies the filter. Values of a kind the filter does not handle pass
    /// through unchanged.
    pub fn apply(&self, value: Value) -> Value {
        match (self, value) {
            (Filter::Trim, Value::String(s)) => Value::String(s.trim().to_string()),
            (Filter::Upper, Value::String(s)) => Value::String(s.to_uppercase()),
            (Filter::Lower, Value::String(s)) => Value::String(s.to_lowercase()),
            (Filter::Ucfirst, Value::String(s)) => Value::String(ucfirst(&s)),
            (Filter::Count, value) => {
                let count = match &value {
                    Value::Null => 0,
                    v if v.is_container() => v.len(),
                    _ => 1,
                };
                Value::from(i64::try_from(count).unwrap_or(i64::MAX))
            }
            (Filter::First, value) if value.is_container() => value
                .children()
                .into_iter()
                .next()
                .map(|(_, child)| child.into_owned())
                .unwrap_or(Value::Null),
            (Filter::Last, value) if value.is_container() => value
                .children()
                .into_iter()
                .last()
                .map(|(_, child)| child.into_owned())
                .unwrap_or(Value::Null),
            (Filter::Keys, value) if value.is_container() => Value::Sequence(
                value
                    .children()
                    .into_iter()
                    .map(|(key, _)| Value::String(key))
                    .collect(),
            ),
            (Filter::Values, value) if value.is_container() => Value::Sequence(
                value
                    .children()
                    .into_iter()
                    .map(|(_, child)| child.into_owned())
                    .collect(),
            ),
            (Filter::Json, value) => {
                Value::String(serde_json::to_string(&value).unwrap_or_default())
            }
            (_, value) => value,
        }
    }
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|filter| filter.name() == s)
            .ok_or_else(|| format!("unknown filter '{s}'"))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
