//! Concrete indices chosen for wildcard positions during expansion.
//!
//! A binding is built one level at a time as the engine enters nested
//! repeated groups. Each level remembers the key found on the read side, the
//! key used on the write side, and the element's ordinal within its group so
//! writes can be renumbered densely.

/// One bound wildcard level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundIndex {
    /// Key at the wildcard position on the side being read
    pub source_key: String,
    /// Key at the wildcard position on the side being written
    pub target_key: String,
    /// Zero-based position of this element within its group
    pub position: usize,
}

/// Ordered wildcard bindings, outermost group first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardBinding {
    levels: Vec<BoundIndex>,
}

impl WildcardBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a binding extended by one level.
    pub fn push(&self, level: BoundIndex) -> Self {
        let mut levels = self.levels.clone();
        levels.push(level);
        Self { levels }
    }

    /// Number of bound wildcard levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[BoundIndex] {
        &self.levels
    }

    /// Keys used when reading.
    pub fn source_keys(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|level| level.source_key.as_str())
    }

    /// Keys used when writing, either as bound or densely renumbered.
    pub fn target_keys(&self, reindex: bool) -> Vec<String> {
        self.levels
            .iter()
            .map(|level| {
                if reindex {
                    level.position.to_string()
                } else {
                    level.target_key.clone()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(source: &str, target: &str, position: usize) -> BoundIndex {
        BoundIndex {
            source_key: source.to_string(),
            target_key: target.to_string(),
            position,
        }
    }

    #[test]
    fn test_push_does_not_mutate_parent() {
        let root = WildcardBinding::new();
        let child = root.push(level("5", "5", 0));
        assert_eq!(root.depth(), 0);
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn test_target_keys_reindexed() {
        let binding = WildcardBinding::new()
            .push(level("5", "5", 0))
            .push(level("10", "10", 1));
        assert_eq!(binding.target_keys(false), vec!["5", "10"]);
        assert_eq!(binding.target_keys(true), vec!["0", "1"]);
        assert_eq!(binding.source_keys().collect::<Vec<_>>(), vec!["5", "10"]);
    }
}
