//! `{{ path }}` expressions embedded in template strings.
//!
//! # Syntax
//!
//! - `{{ user.name }}` - whole-string reference, keeps the value's type
//! - `Hello {{ user.name }}!` - interpolation, renders values as text
//! - `{{ user.nick ?? 'anon' }}` - fallback when the path is missing or null
//! - `{{ user.name | trim | upper }}` - filters, applied left to right
//!
//! Default literals are quoted strings, integers, floats, `true`, `false` or
//! `null`; any other bare word is taken as a string.

use super::filters::Filter;
use crate::document::node::{Number, Value};
use crate::mapping::error::MappingError;
use crate::path::ast::PathExpression;
use crate::path::cache::PathCache;
use std::sync::Arc;

/// A path reference inside `{{ }}` with its fallback and filters.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRef {
    pub path: Arc<PathExpression>,
    pub default: Option<Value>,
    pub filters: Vec<Filter>,
}

impl PathRef {
    pub fn new(path: Arc<PathExpression>) -> Self {
        Self {
            path,
            default: None,
            filters: Vec::new(),
        }
    }

    /// Applies the fallback and filters to a resolved value.
    pub fn finish(&self, resolved: Option<Value>) -> Value {
        let mut value = match (resolved, &self.default) {
            (Some(value), Some(default)) if value.is_null() => default.clone(),
            (Some(value), _) => value,
            (None, Some(default)) => default.clone(),
            (None, None) => Value::Null,
        };
        for filter in &self.filters {
            value = filter.apply(value);
        }
        value
    }

    /// True when the value written back on reverse is what forward read.
    pub fn is_invertible(&self) -> bool {
        self.filters.is_empty()
    }
}

/// A piece of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Path(PathRef),
}

/// A parsed template string containing at least one `{{ }}` reference.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateExpression {
    raw: String,
    parts: Vec<Part>,
}

impl TemplateExpression {
    /// Whether `raw` holds a `{{` followed later by `}}`. A lone `{{` is
    /// ordinary text.
    pub fn is_marked(raw: &str) -> bool {
        raw.find("{{").is_some_and(|open| raw[open + 2..].contains("}}"))
    }

    /// Parses a template string; `Ok(None)` when it has no markers.
    ///
    /// # Errors
    ///
    /// `MappingError::InvalidTemplate` for a `{{` left open after a
    /// complete expression, empty braces,
    /// unknown filters or trailing garbage; `MappingError::Path` for a
    /// malformed path.
    pub fn parse(raw: &str, cache: &PathCache) -> Result<Option<Self>, MappingError> {
        if !Self::is_marked(raw) {
            return Ok(None);
        }
        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find("{{") {
            if open > 0 {
                parts.push(Part::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| MappingError::template(raw, "unterminated '{{'"))?;
            parts.push(Part::Path(InnerParser::new(raw, &after[..close]).parse(cache)?));
            rest = &after[close + 2..];
        }
        if !rest.is_empty() {
            parts.push(Part::Text(rest.to_string()));
        }
        Ok(Some(Self {
            raw: raw.to_string(),
            parts,
        }))
    }

    /// Expression reading a single path with no text, default or filters.
    pub fn from_path(path: Arc<PathExpression>) -> Self {
        Self {
            raw: format!("{{{{ {path} }}}}"),
            parts: vec![Part::Path(PathRef::new(path))],
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Path references in order of appearance.
    pub fn paths(&self) -> impl Iterator<Item = &PathRef> {
        self.parts.iter().filter_map(|part| match part {
            Part::Path(path) => Some(path),
            Part::Text(_) => None,
        })
    }

    /// The only path reference, if there is exactly one.
    pub fn single_path(&self) -> Option<&PathRef> {
        let mut paths = self.paths();
        let first = paths.next()?;
        paths.next().is_none().then_some(first)
    }

    /// True for `"{{ path }}"` with no surrounding text.
    pub fn is_whole(&self) -> bool {
        matches!(self.parts.as_slice(), [Part::Path(_)])
    }

    /// Produces the expression's value, resolving each path with `resolve`.
    ///
    /// A whole-string expression keeps the resolved type; anything else is
    /// rendered to text and concatenated.
    pub fn evaluate<F>(&self, mut resolve: F) -> Value
    where
        F: FnMut(&PathExpression) -> Option<Value>,
    {
        if let [Part::Path(path)] = self.parts.as_slice() {
            return path.finish(resolve(path.path.as_ref()));
        }
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Path(path) => out.push_str(&path.finish(resolve(path.path.as_ref())).to_text()),
            }
        }
        Value::String(out)
    }

    /// Recovers the value forward mapping read, given what it wrote.
    ///
    /// Only single-path expressions can be inverted. Literal text around the
    /// path is stripped when the mapped string carries it; otherwise the
    /// mapped value is returned as is.
    pub fn invert(&self, mapped: Value) -> Option<Value> {
        self.single_path()?;
        if self.is_whole() {
            return Some(mapped);
        }
        let (prefix, suffix) = self.surrounding_text();
        let stripped = match &mapped {
            Value::String(s) => s
                .strip_prefix(prefix.as_str())
                .and_then(|s| s.strip_suffix(suffix.as_str()))
                .map(|s| Value::String(s.to_string())),
            _ => None,
        };
        Some(stripped.unwrap_or(mapped))
    }

    fn surrounding_text(&self) -> (String, String) {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut seen_path = false;
        for part in &self.parts {
            match part {
                Part::Path(_) => seen_path = true,
                Part::Text(text) if seen_path => suffix.push_str(text),
                Part::Text(text) => prefix.push_str(text),
            }
        }
        (prefix, suffix)
    }
}

/// Parser for the text between `{{` and `}}`.
struct InnerParser<'a> {
    raw: &'a str,
    input: Vec<char>,
    position: usize,
}

impl<'a> InnerParser<'a> {
    fn new(raw: &'a str, inner: &str) -> Self {
        Self {
            raw,
            input: inner.chars().collect(),
            position: 0,
        }
    }

    fn parse(mut self, cache: &PathCache) -> Result<PathRef, MappingError> {
        self.skip_whitespace();
        let path = self.take_while(|c| !c.is_whitespace() && c != '|' && c != '?');
        if path.is_empty() {
            return Err(self.error("empty expression"));
        }
        let mut reference = PathRef::new(cache.get_or_parse(&path)?);

        self.skip_whitespace();
        if self.peek() == Some('?') {
            self.next();
            if self.next() != Some('?') {
                return Err(self.error("expected '??' before default"));
            }
            self.skip_whitespace();
            reference.default = Some(self.parse_literal()?);
            self.skip_whitespace();
        }

        while self.peek() == Some('|') {
            self.next();
            self.skip_whitespace();
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            let filter = name
                .parse::<Filter>()
                .map_err(|reason| MappingError::template(self.raw, reason))?;
            reference.filters.push(filter);
            self.skip_whitespace();
        }

        match self.peek() {
            None => Ok(reference),
            Some(c) => Err(self.error(format!("unexpected '{c}' at position {}", self.position))),
        }
    }

    fn parse_literal(&mut self) -> Result<Value, MappingError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.next();
                let text = self.take_while(|c| c != quote);
                if self.next() != Some(quote) {
                    return Err(self.error("unterminated string default"));
                }
                Ok(Value::String(text))
            }
            Some(_) => {
                let word = self.take_while(|c| !c.is_whitespace() && c != '|');
                Ok(literal_word(&word))
            }
            None => Err(self.error("missing default after '??'")),
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.position;
        while self.peek().is_some_and(&keep) {
            self.position += 1;
        }
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    fn error(&self, reason: impl Into<String>) -> MappingError {
        MappingError::template(self.raw, reason)
    }
}

fn literal_word(word: &str) -> Value {
    match word {
        "null" => Value::Null,
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => {
            if let Ok(i) = word.parse::<i64>() {
                Value::Number(Number::Integer(i))
            } else if let Ok(f) = word.parse::<f64>() {
                Value::Number(Number::Float(f))
            } else {
                Value::String(word.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> TemplateExpression {
        TemplateExpression::parse(raw, &PathCache::new()).unwrap().unwrap()
    }

    #[test]
    fn test_plain_string_is_not_an_expression() {
        assert!(TemplateExpression::parse("premium", &PathCache::new()).unwrap().is_none());
    }

    #[test]
    fn test_whole_expression_trims_whitespace() {
        let expr = parse("{{   user.name }}");
        assert!(expr.is_whole());
        assert_eq!(expr.single_path().unwrap().path.as_str(), "user.name");
    }

    #[test]
    fn test_interpolation_parts() {
        let expr = parse("Hi {{ first }} {{last}}!");
        assert_eq!(expr.parts().len(), 5);
        assert!(expr.single_path().is_none());
        let value = expr.evaluate(|path| Some(Value::from(path.as_str().to_uppercase())));
        assert_eq!(value, Value::from("Hi FIRST LAST!"));
    }

    #[test]
    fn test_whole_expression_keeps_type() {
        let expr = parse("{{ age }}");
        assert_eq!(expr.evaluate(|_| Some(Value::from(30))), Value::from(30));
    }

    #[test]
    fn test_default_and_filters() {
        let expr = parse("{{ user.nick ?? 'anon user' | upper }}");
        let path = expr.single_path().unwrap();
        assert_eq!(path.default, Some(Value::from("anon user")));
        assert_eq!(path.filters, vec![Filter::Upper]);
        assert_eq!(expr.evaluate(|_| None), Value::from("ANON USER"));
        assert_eq!(expr.evaluate(|_| Some(Value::Null)), Value::from("ANON USER"));
        assert_eq!(expr.evaluate(|_| Some(Value::from("bo"))), Value::from("BO"));
    }

    #[test]
    fn test_bare_defaults() {
        assert_eq!(parse("{{ a ?? 5 }}").single_path().unwrap().default, Some(Value::from(5)));
        assert_eq!(parse("{{ a ?? false }}").single_path().unwrap().default, Some(Value::from(false)));
        assert_eq!(parse("{{ a ?? none }}").single_path().unwrap().default, Some(Value::from("none")));
    }

    #[test]
    fn test_errors() {
        let cache = PathCache::new();
        for raw in ["{{ a }} {{ b", "{{ }}", "{{ a | shout }}", "{{ a ? 1 }}", "{{ a b }}", "{{ a ?? 'x }}"] {
            assert!(
                matches!(TemplateExpression::parse(raw, &cache), Err(MappingError::InvalidTemplate { .. })),
                "{raw} should fail"
            );
        }
        assert!(matches!(
            TemplateExpression::parse("{{ a..b }}", &cache),
            Err(MappingError::Path(_))
        ));
    }

    #[test]
    fn test_open_braces_without_close_are_text() {
        let cache = PathCache::new();
        assert!(!TemplateExpression::is_marked("type {{ to open"));
        assert!(!TemplateExpression::is_marked("}} then {{"));
        assert!(TemplateExpression::is_marked("a {{ b }}"));
        assert_eq!(TemplateExpression::parse("type {{ to open", &cache).unwrap(), None);
    }

    #[test]
    fn test_invert_strips_surrounding_text() {
        let expr = parse("ID-{{ id }}");
        assert_eq!(expr.invert(Value::from("ID-42")), Some(Value::from("42")));
        assert_eq!(expr.invert(Value::from("42")), Some(Value::from("42")));
        assert_eq!(parse("{{ a }}{{ b }}").invert(Value::from("xy")), None);
    }
}
