//! Dotted path string parser.

use super::ast::{PathExpression, Segment};
use super::error::PathError;

/// Parser for dotted path strings.
///
/// Segments are separated by `.`; a segment that is exactly `*` is a
/// wildcard, anything else is a key. Empty paths and empty segments are
/// rejected.
pub struct Parser;

impl Parser {
    /// Parses a path string into a `PathExpression`.
    ///
    /// This always parses; use [`PathCache`](super::cache::PathCache) to reuse
    /// expressions across calls.
    ///
    /// # Example
    ///
    /// ```
    /// use mapquill::path::{Parser, Segment};
    ///
    /// let path = Parser::parse("users.*.name").unwrap();
    /// assert_eq!(path.segments()[1], Segment::Wildcard);
    /// assert!(path.has_wildcard());
    /// ```
    pub fn parse(path: &str) -> Result<PathExpression, PathError> {
        if path.is_empty() {
            return Err(PathError::invalid(path, "path is empty"));
        }

        let mut segments = Vec::new();
        for (position, raw) in path.split('.').enumerate() {
            if raw.is_empty() {
                return Err(PathError::invalid(
                    path,
                    format!("empty segment at position {}", position),
                ));
            }
            segments.push(if raw == "*" {
                Segment::Wildcard
            } else {
                Segment::Key(raw.to_string())
            });
        }

        let expression = PathExpression::from_segments(segments);
        debug_assert_eq!(expression.as_str(), path);
        Ok(expression)
    }
}
