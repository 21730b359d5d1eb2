//! Interning table for parsed path expressions.
//!
//! Templates reference a small, static set of paths, so parsed expressions are
//! kept for the lifetime of the cache. Lookups are lock-free reads on the
//! shard; a miss parses outside the map and inserts only if still absent, so
//! concurrent callers always share one `Arc` per path string.

use super::ast::PathExpression;
use super::error::PathError;
use super::parser::Parser;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::trace;

static GLOBAL: Lazy<Arc<PathCache>> = Lazy::new(|| Arc::new(PathCache::new()));

/// Thread-safe cache of parsed path expressions keyed by source string.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: DashMap<String, Arc<PathExpression>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// The process-wide cache shared by engines that were not given their own.
    pub fn global() -> Arc<PathCache> {
        Arc::clone(&GLOBAL)
    }

    /// Returns the cached expression for `path`, parsing it on first use.
    ///
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, path: &str) -> Result<Arc<PathExpression>, PathError> {
        if let Some(entry) = self.entries.get(path) {
            return Ok(Arc::clone(entry.value()));
        }

        trace!(path, "path cache miss");
        let parsed = Arc::new(Parser::parse(path)?);
        let entry = self.entries.entry(path.to_string()).or_insert(parsed);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl PathExpression {
    /// Parses `path` through the process-wide cache.
    ///
    /// # Example
    ///
    /// ```
    /// use mapquill::path::PathExpression;
    ///
    /// let a = PathExpression::parse("user.name").unwrap();
    /// let b = PathExpression::parse("user.name").unwrap();
    /// assert!(std::sync::Arc::ptr_eq(&a, &b));
    /// ```
    pub fn parse(path: &str) -> Result<Arc<PathExpression>, PathError> {
        GLOBAL.get_or_parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_returns_shared_instance() {
        let cache = PathCache::new();
        let first = cache.get_or_parse("a.b").unwrap();
        let second = cache.get_or_parse("a.b").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache = PathCache::new();
        assert!(cache.get_or_parse("a..b").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_lookups_share_one_entry() {
        let cache = Arc::new(PathCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_parse("users.*.name").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
        assert_eq!(cache.len(), 1);
    }
}
