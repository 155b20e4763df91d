//! Search-scoped identities for runtime values
//!
//! The registry is keyed by the host's identity token rather than by the value
//! itself, so assigning an id never extends a value's lifetime.

use crate::graph::ValueId;
use std::collections::HashMap;
use std::hash::Hash;

/// Namespace a value's id is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// Objects, functions, collections and other reference values
    Reference,
    /// Symbol-like key values
    Symbol,
}

/// Assigns stable [`ValueId`]s to host identity tokens
///
/// One registry belongs to exactly one search; ids are never reused within it.
#[derive(Debug, Clone)]
pub struct IdentityRegistry<H> {
    assigned: HashMap<H, ValueId>,
    next_object: u32,
    next_symbol: u32,
}

impl<H: Copy + Eq + Hash> IdentityRegistry<H> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            assigned: HashMap::new(),
            next_object: 0,
            next_symbol: 0,
        }
    }

    /// Pin `handle` to a reserved id.
    ///
    /// Returns the id the handle ends up with: the reserved one, or the id it
    /// was already assigned.
    pub fn reserve(&mut self, handle: H, id: ValueId) -> ValueId {
        *self.assigned.entry(handle).or_insert(id)
    }

    /// Id for `handle`, assigning the next id of `category` on first sight
    pub fn id_for(&mut self, handle: H, category: ValueCategory) -> ValueId {
        if let Some(&id) = self.assigned.get(&handle) {
            return id;
        }
        let id = match category {
            ValueCategory::Reference => {
                let id = ValueId::Object(self.next_object);
                self.next_object += 1;
                id
            }
            ValueCategory::Symbol => {
                let id = ValueId::Symbol(self.next_symbol);
                self.next_symbol += 1;
                id
            }
        };
        self.assigned.insert(handle, id);
        id
    }

    /// Id already assigned to `handle`, if any
    pub fn lookup(&self, handle: &H) -> Option<ValueId> {
        self.assigned.get(handle).copied()
    }

    /// Number of handles with an id
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Check if no id has been assigned yet
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

impl<H: Copy + Eq + Hash> Default for IdentityRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
