//! Integration tests for path reads and writes.

use indexmap::IndexMap;
use mapquill::document::node::{Record, Value};
use mapquill::path::{DataAccessor, DataMutator, PathCache, PathError, PathExpression, Resolved};
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn path(raw: &str) -> Arc<PathExpression> {
    PathExpression::parse(raw).unwrap()
}

/// `{"k0": {"k1": ... {"k<depth-1>": "leaf"}}}`
fn nested(depth: usize) -> (Value, String) {
    let mut value = v(json!("leaf"));
    for level in (0..depth).rev() {
        let mut map = IndexMap::new();
        map.insert(format!("k{level}"), value);
        map.insert("other".to_string(), Value::from(level as i64));
        value = Value::Map(map);
    }
    let keys: Vec<String> = (0..depth).map(|level| format!("k{level}")).collect();
    (value, keys.join("."))
}

#[test]
fn test_direct_lookup_matches_manual_walk_at_every_depth() {
    for depth in 1..=10 {
        let (root, raw) = nested(depth);
        let expr = path(&raw);

        let mut manual: &Value = &root;
        for level in 0..depth {
            manual = &manual.as_map().unwrap()[&format!("k{level}")];
        }

        let found = DataAccessor::new(&root).value(&expr).unwrap();
        assert!(matches!(found, Cow::Borrowed(_)), "depth {depth} should borrow");
        assert_eq!(found.as_ref(), manual);
        assert_eq!(found.as_ref(), &Value::from("leaf"));
    }
}

#[test]
fn test_missing_segment_is_none() {
    let root = v(json!({"user": {"name": "Alice"}, "tags": ["a"]}));
    let accessor = DataAccessor::new(&root);

    assert_eq!(accessor.value(&path("user.email")), None);
    assert_eq!(accessor.value(&path("user.name.first")), None);
    assert_eq!(accessor.value(&path("tags.3")), None);
    assert_eq!(accessor.get_default(&path("user.email"), Value::from("n/a")), Value::from("n/a"));
}

#[test]
fn test_wildcard_expansion_is_keyed_by_concrete_path() {
    let root = v(json!({"users": [{"name": "Ann"}, {"name": "Bo"}, {"age": 3}]}));
    let accessor = DataAccessor::new(&root);

    let Resolved::Expanded(found) = accessor.get(&path("users.*.name")) else {
        panic!("expected expansion");
    };
    let expected: IndexMap<String, Value> = [
        ("users.0.name".to_string(), Value::from("Ann")),
        ("users.1.name".to_string(), Value::from("Bo")),
    ]
    .into_iter()
    .collect();
    assert_eq!(found, expected);
}

#[test]
fn test_wildcard_enumerates_map_keys() {
    let root = v(json!({"items": {"5": "a", "10": "b"}}));
    let found = DataAccessor::new(&root).expand(&path("items.*"));
    assert_eq!(found.keys().collect::<Vec<_>>(), ["items.5", "items.10"]);
}

#[test]
fn test_named_sources() {
    let mut sources = IndexMap::new();
    sources.insert("user".to_string(), v(json!({"name": "Ann"})));
    sources.insert("order".to_string(), v(json!({"total": 3})));
    let accessor = DataAccessor::named(&sources);

    assert_eq!(accessor.value(&path("user.name")).as_deref(), Some(&Value::from("Ann")));
    assert_eq!(accessor.value(&path("order.total")).as_deref(), Some(&Value::from(3)));
    assert_eq!(accessor.value(&path("missing.total")), None);
}

#[test]
fn test_object_reads_are_owned() {
    let root = Value::Object(Box::new(
        Record::new("User").with("address", v(json!({"city": "Oslo"}))),
    ));
    let found = DataAccessor::new(&root).value(&path("address.city")).unwrap();
    assert!(matches!(found, Cow::Owned(_)));
    assert_eq!(found.as_ref(), &Value::from("Oslo"));
}

#[test]
fn test_set_creates_containers() {
    let mut root = Value::Null;
    let mut mutator = DataMutator::new(&mut root);
    mutator.set(&path("a.b"), Value::from(1)).unwrap();
    mutator.set(&path("list.0.x"), Value::from("first")).unwrap();
    mutator.set(&path("list.1.x"), Value::from("second")).unwrap();

    assert_eq!(
        root,
        v(json!({"a": {"b": 1}, "list": [{"x": "first"}, {"x": "second"}]}))
    );
}

#[test]
fn test_set_sparse_index_promotes_to_map() {
    let mut root = v(json!({"list": ["a", "b"]}));
    DataMutator::new(&mut root).set(&path("list.5"), Value::from("f")).unwrap();
    assert_eq!(root, v(json!({"list": {"0": "a", "1": "b", "5": "f"}})));
}

#[test]
fn test_set_through_scalar_replaces_it() {
    let mut root = v(json!({"a": 1}));
    DataMutator::new(&mut root).set(&path("a.b"), Value::from(2)).unwrap();
    assert_eq!(root, v(json!({"a": {"b": 2}})));
}

#[test]
fn test_set_wildcard_without_binding_fails() {
    let mut root = Value::Null;
    let err = DataMutator::new(&mut root)
        .set(&path("users.*.name"), Value::from("x"))
        .unwrap_err();
    assert!(matches!(err, PathError::UnboundWildcard { position: 0, .. }));
    assert_eq!(root, Value::Null);
}

#[test]
fn test_set_into_object() {
    let mut root = Value::Object(Box::new(Record::new("User")));
    DataMutator::new(&mut root)
        .set(&path("profile.name"), Value::from("Ann"))
        .unwrap();
    assert_eq!(
        root,
        Value::Object(Box::new(
            Record::new("User").with("profile", v(json!({"name": "Ann"})))
        ))
    );
}

#[test]
fn test_remove() {
    let mut root = v(json!({"a": {"b": 1, "c": 2}, "list": ["x", "y", "z"]}));
    let mut mutator = DataMutator::new(&mut root);

    assert_eq!(mutator.remove(&path("a.b")).unwrap(), Some(Value::from(1)));
    assert_eq!(mutator.remove(&path("a.missing")).unwrap(), None);
    assert_eq!(mutator.remove(&path("list.2")).unwrap(), Some(Value::from("z")));
    assert_eq!(mutator.remove(&path("list.0")).unwrap(), Some(Value::from("x")));

    assert_eq!(root, v(json!({"a": {"c": 2}, "list": {"1": "y"}})));
}

#[test]
fn test_invalid_paths() {
    for raw in ["", "a..b", ".a", "a."] {
        assert!(
            matches!(PathExpression::parse(raw), Err(PathError::InvalidPath { .. })),
            "{raw:?} should be rejected"
        );
    }
}

#[test]
fn test_cache_shares_parsed_paths() {
    let cache = PathCache::new();
    let first = cache.get_or_parse("users.*.name").unwrap();
    let second = cache.get_or_parse("users.*.name").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.get_or_parse("a..b").is_err());
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}
