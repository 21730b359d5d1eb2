//! Parsed form of a dotted path expression.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named key, sequence index or attribute (`users`, `0`)
    Key(String),
    /// Every child of the current container (`*`)
    Wildcard,
}

impl Segment {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(key) => Some(key),
            Segment::Wildcard => None,
        }
    }
}

/// A complete, immutable path expression such as `users.*.name`.
///
/// The wildcard count is computed once at construction so `has_wildcard`
/// never rescans the segments. Equality and hashing use the source string.
#[derive(Debug, Clone)]
pub struct PathExpression {
    source: String,
    segments: Vec<Segment>,
    wildcards: usize,
}

impl PathExpression {
    /// Builds an expression directly from segments, bypassing text parsing.
    ///
    /// Keys may contain dots; they still form a single segment.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let source = render(&segments, &[]);
        let wildcards = wildcard_count(&segments);
        Self {
            source,
            segments,
            wildcards,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcards > 0
    }

    pub fn wildcard_count(&self) -> usize {
        self.wildcards
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The text this expression was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Segments up to and including the `ordinal`-th wildcard (1-based).
    pub fn through_wildcard(&self, ordinal: usize) -> Option<&[Segment]> {
        if ordinal > self.wildcards {
            return None;
        }
        through_wildcard(&self.segments, ordinal)
    }

    /// Returns a copy with `other` appended.
    pub fn join(&self, other: &PathExpression) -> PathExpression {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        PathExpression::from_segments(segments)
    }
}

/// Prefix of `segments` ending at the `ordinal`-th wildcard (1-based).
pub fn through_wildcard(segments: &[Segment], ordinal: usize) -> Option<&[Segment]> {
    if ordinal == 0 {
        return None;
    }
    segments
        .iter()
        .enumerate()
        .filter(|(_, segment)| segment.is_wildcard())
        .nth(ordinal - 1)
        .map(|(index, _)| &segments[..=index])
}

/// Number of wildcard segments in `segments`.
pub fn wildcard_count(segments: &[Segment]) -> usize {
    segments.iter().filter(|segment| segment.is_wildcard()).count()
}

/// Dotted form of `segments` with leading wildcards replaced by `keys`.
///
/// Wildcards beyond `keys` stay as `*`.
pub fn render(segments: &[Segment], keys: &[&str]) -> String {
    let mut keys = keys.iter();
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Key(key) => key.as_str(),
            Segment::Wildcard => keys.next().copied().unwrap_or("*"),
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl PartialEq for PathExpression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.segments == other.segments
    }
}

impl Eq for PathExpression {}

impl Hash for PathExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_segments_counts_wildcards() {
        let path = PathExpression::from_segments(vec![
            Segment::Key("users".to_string()),
            Segment::Wildcard,
            Segment::Key("tags".to_string()),
            Segment::Wildcard,
        ]);
        assert_eq!(path.as_str(), "users.*.tags.*");
        assert_eq!(path.wildcard_count(), 2);
        assert!(path.has_wildcard());
    }

    #[test]
    fn test_through_wildcard() {
        let path = PathExpression::from_segments(vec![
            Segment::Key("a".to_string()),
            Segment::Wildcard,
            Segment::Key("b".to_string()),
            Segment::Wildcard,
            Segment::Key("c".to_string()),
        ]);
        assert_eq!(path.through_wildcard(1).map(<[Segment]>::len), Some(2));
        assert_eq!(path.through_wildcard(2).map(<[Segment]>::len), Some(4));
        assert!(path.through_wildcard(3).is_none());
        assert!(path.through_wildcard(0).is_none());
    }

    #[test]
    fn test_render_substitutes_leading_wildcards() {
        let segments = vec![
            Segment::Key("users".to_string()),
            Segment::Wildcard,
            Segment::Key("tags".to_string()),
            Segment::Wildcard,
        ];
        assert_eq!(render(&segments, &["3"]), "users.3.tags.*");
        assert_eq!(render(&segments, &["3", "1"]), "users.3.tags.1");
    }

    #[test]
    fn test_join() {
        let a = PathExpression::from_segments(vec![Segment::Key("a".to_string())]);
        let b = PathExpression::from_segments(vec![Segment::Wildcard]);
        let joined = a.join(&b);
        assert_eq!(joined.to_string(), "a.*");
        assert_eq!(joined.len(), 2);
    }
}
