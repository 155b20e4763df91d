//! Per-key defined/resolved state

use super::error::{OwnershipError, OwnershipResult};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// The key resolution map
///
/// Absent means undefined, `false` means defined but not yet resolved, `true`
/// means resolved. Entries only ever move from `false` to `true`.
#[derive(Debug, Clone)]
pub struct KeyResolutions<K> {
    states: HashMap<K, bool>,
}

impl<K: Eq + Hash + Display> KeyResolutions<K> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Define `key` as known but unresolved
    pub fn define(&mut self, key: K) -> OwnershipResult<()> {
        if self.states.contains_key(&key) {
            return Err(OwnershipError::KeyAlreadyDefined(key.to_string()));
        }
        self.states.insert(key, false);
        Ok(())
    }

    /// Mark `key` resolved. Returns true only on the first resolution.
    pub fn resolve(&mut self, key: &K) -> OwnershipResult<bool> {
        let state = self
            .states
            .get_mut(key)
            .ok_or_else(|| OwnershipError::KeyNotDefined(key.to_string()))?;
        let newly = !*state;
        *state = true;
        Ok(newly)
    }

    pub fn is_defined(&self, key: &K) -> bool {
        self.states.contains_key(key)
    }

    pub fn is_resolved(&self, key: &K) -> bool {
        self.states.get(key).copied().unwrap_or(false)
    }

    /// Number of defined keys
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of resolved keys
    pub fn resolved_count(&self) -> usize {
        self.states.values().filter(|&&resolved| resolved).count()
    }
}

impl<K: Eq + Hash + Display> Default for KeyResolutions<K> {
    fn default() -> Self {
        Self::new()
    }
}
