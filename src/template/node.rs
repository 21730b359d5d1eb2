//! Parsed template trees.

use super::expression::TemplateExpression;
use crate::document::node::Value;
use crate::mapping::error::MappingError;
use crate::path::ast::{PathExpression, Segment};
use crate::path::cache::PathCache;
use std::sync::Arc;

/// One keyed child of a nested template. `path` is the key parsed as a path
/// relative to the parent's output position, so `"profile.name"` and `"*"`
/// are both valid keys.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    pub key: String,
    pub path: Arc<PathExpression>,
    pub node: TemplateNode,
}

/// A node of a template tree, mirroring the shape of the output.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// Static value, copied forward and ignored on reverse
    Literal(Value),
    /// String with `{{ }}` references
    Expression(TemplateExpression),
    /// Map whose keys are output paths
    Nested(Vec<TemplateEntry>),
    /// Sequence whose elements land at their index
    List(Vec<TemplateNode>),
}

impl TemplateNode {
    /// Calls `visit` for every expression in document order.
    pub fn for_each_expression<'a>(&'a self, visit: &mut impl FnMut(&'a TemplateExpression)) {
        match self {
            TemplateNode::Literal(_) => {}
            TemplateNode::Expression(expr) => visit(expr),
            TemplateNode::Nested(entries) => {
                for entry in entries {
                    entry.node.for_each_expression(visit);
                }
            }
            TemplateNode::List(items) => {
                for item in items {
                    item.for_each_expression(visit);
                }
            }
        }
    }
}

/// A complete mapping template.
///
/// # Example
///
/// ```
/// use mapquill::template::Template;
///
/// let template = Template::from_json(r#"{
///     "fullName": "{{ user.profile.name }}",
///     "names": {"*": "{{ users.*.name }}"},
///     "type": "premium"
/// }"#).unwrap();
/// assert_eq!(template.source_paths(), vec!["user.profile.name", "users.*.name"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: TemplateNode,
}

impl Template {
    /// Parses a template value using the process-wide path cache.
    ///
    /// # Errors
    ///
    /// Fails on malformed keys or expressions.
    pub fn parse(raw: &Value) -> Result<Self, MappingError> {
        Self::parse_with(raw, &PathCache::global())
    }

    /// Parses a template value using `cache` for every path.
    ///
    /// An empty map or sequence at the root maps nothing and leaves the
    /// target untouched.
    pub fn parse_with(raw: &Value, cache: &PathCache) -> Result<Self, MappingError> {
        let root = match raw {
            Value::Map(map) if map.is_empty() => TemplateNode::Nested(Vec::new()),
            Value::Sequence(items) if items.is_empty() => TemplateNode::List(Vec::new()),
            other => parse_node(other, cache)?,
        };
        Ok(Self { root })
    }

    /// Parses JSON template text.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw = crate::document::parser::parse_json(json)?;
        Ok(Self::parse(&raw)?)
    }

    pub fn from_root(root: TemplateNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TemplateNode {
        &self.root
    }

    /// Source paths referenced by the template, in document order.
    pub fn source_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.root.for_each_expression(&mut |expr| {
            paths.extend(expr.paths().map(|path| path.path.as_str()));
        });
        paths
    }
}

fn parse_node(raw: &Value, cache: &PathCache) -> Result<TemplateNode, MappingError> {
    match raw {
        Value::String(s) => Ok(match TemplateExpression::parse(s, cache)? {
            Some(expr) => TemplateNode::Expression(expr),
            None => TemplateNode::Literal(raw.clone()),
        }),
        Value::Map(map) if !map.is_empty() => {
            let entries = map
                .iter()
                .map(|(key, child)| {
                    Ok(TemplateEntry {
                        key: key.clone(),
                        path: cache.get_or_parse(key)?,
                        node: parse_node(child, cache)?,
                    })
                })
                .collect::<Result<Vec<_>, MappingError>>()?;
            Ok(TemplateNode::Nested(entries))
        }
        Value::Sequence(items) if !items.is_empty() => Ok(TemplateNode::List(
            items
                .iter()
                .map(|item| parse_node(item, cache))
                .collect::<Result<_, _>>()?,
        )),
        other => Ok(TemplateNode::Literal(other.clone())),
    }
}

/// Identity template copying each top-level key of `value` to the same key.
///
/// Keys are used verbatim as single segments, so a key containing a dot is
/// not split.
pub fn identity_template(value: &Value) -> Template {
    let entries = value
        .children()
        .into_iter()
        .map(|(key, _)| {
            let path = Arc::new(PathExpression::from_segments(vec![Segment::Key(key.clone())]));
            TemplateEntry {
                key,
                node: TemplateNode::Expression(TemplateExpression::from_path(Arc::clone(&path))),
                path,
            }
        })
        .collect();
    Template::from_root(TemplateNode::Nested(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kinds() {
        let raw = Value::from(json!({
            "name": "{{ user.name }}",
            "type": "premium",
            "count": 3,
            "tags": ["{{ a }}", "x"],
            "empty": {}
        }));
        let template = Template::parse_with(&raw, &PathCache::new()).unwrap();
        let TemplateNode::Nested(entries) = template.root() else {
            panic!("expected nested root");
        };
        assert!(matches!(entries[0].node, TemplateNode::Expression(_)));
        assert_eq!(entries[1].node, TemplateNode::Literal(Value::from("premium")));
        assert_eq!(entries[2].node, TemplateNode::Literal(Value::from(3)));
        assert!(matches!(entries[3].node, TemplateNode::List(ref items) if items.len() == 2));
        assert!(matches!(entries[4].node, TemplateNode::Literal(Value::Map(_))));
    }

    #[test]
    fn test_dotted_keys_become_paths() {
        let raw = Value::from(json!({"profile.name": "{{ user.name }}", "*": "{{ x.* }}"}));
        let template = Template::parse_with(&raw, &PathCache::new()).unwrap();
        let TemplateNode::Nested(entries) = template.root() else {
            panic!("expected nested root");
        };
        assert_eq!(entries[0].path.len(), 2);
        assert!(entries[1].path.has_wildcard());
    }

    #[test]
    fn test_empty_root_maps_nothing() {
        let template = Template::parse_with(&Value::from(json!({})), &PathCache::new()).unwrap();
        assert_eq!(template.root(), &TemplateNode::Nested(Vec::new()));
        // Nested empty maps are still literal values
        let template = Template::parse_with(&Value::from(json!({"meta": {}})), &PathCache::new()).unwrap();
        let TemplateNode::Nested(entries) = template.root() else {
            panic!("expected nested root");
        };
        assert_eq!(entries[0].node, TemplateNode::Literal(Value::from(json!({}))));
    }

    #[test]
    fn test_invalid_key_fails() {
        let raw = Value::from(json!({"a..b": "{{ x }}"}));
        assert!(matches!(
            Template::parse_with(&raw, &PathCache::new()),
            Err(MappingError::Path(_))
        ));
    }

    #[test]
    fn test_identity_template_keeps_dotted_keys_whole() {
        let template = identity_template(&Value::from(json!({"a.b": 1, "c": 2})));
        assert_eq!(template.source_paths(), vec!["a.b", "c"]);
        let TemplateNode::Nested(entries) = template.root() else {
            panic!("expected nested root");
        };
        assert_eq!(entries[0].path.len(), 1);
    }
}
