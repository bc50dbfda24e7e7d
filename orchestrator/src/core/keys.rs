//! Combination deduplication
//!
//! A combination is canonicalized into a string key made of its part ids in
//! order, so two combinations are equal exactly when they show the same
//! parts in the same positions. Ids are joined with the ASCII unit
//! separator, which never appears in a part id.

use std::collections::HashSet;

use shared::MediaPart;

const KEY_SEPARATOR: &str = "\x1f";

/// Canonical key of an ordered part list
pub fn combination_key(parts: &[MediaPart]) -> String {
    parts
        .iter()
        .map(|part| part.id.as_str())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Set of combination keys already handed out
#[derive(Debug, Default)]
pub struct CombinationKeyStore {
    used: HashSet<String>,
}

impl CombinationKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the combination, returns false if it was already present
    pub fn insert(&mut self, parts: &[MediaPart]) -> bool {
        self.used.insert(combination_key(parts))
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
