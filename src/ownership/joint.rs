//! Joint ownership of a single conditional edge
//!
//! A tracker waits for every one of a fixed set of owner keys to resolve and
//! then fires exactly once. An empty owner set, or one whose members are all
//! already resolved, fires as soon as it is checked.

use super::keys::KeyResolutions;
use std::fmt::Display;
use std::hash::Hash;

/// Lifecycle of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Waiting on this many distinct owners
    Pending(usize),
    /// Resolver has run; terminal
    Fired,
}

/// Waits for all owners of one child edge to resolve
///
/// The resolver is handed in per call and receives
/// `(child_key, owner_keys, context, tracker)`, with owner keys in exactly the
/// order they were given at construction.
#[derive(Debug, Clone)]
pub struct JointOwnershipTracker<K, C> {
    child: K,
    owners: Vec<K>,
    pending: Vec<K>,
    context: C,
    fired: bool,
}

impl<K, C> JointOwnershipTracker<K, C>
where
    K: Clone + Eq + Hash + Display,
{
    /// Freeze the owner list and note which owners are still unresolved
    pub fn new(child: K, owners: Vec<K>, context: C, resolutions: &KeyResolutions<K>) -> Self {
        let mut pending: Vec<K> = Vec::with_capacity(owners.len());
        for owner in &owners {
            if !resolutions.is_resolved(owner) && !pending.contains(owner) {
                pending.push(owner.clone());
            }
        }
        Self {
            child,
            owners,
            pending,
            context,
            fired: false,
        }
    }

    /// Fire now if no owner is pending. Returns true if this call fired.
    pub fn fire_callback_if_empty<F>(&mut self, resolver: F) -> bool
    where
        F: FnOnce(&K, &[K], &C, &Self),
    {
        if self.fired || !self.pending.is_empty() {
            return false;
        }
        self.fire(resolver);
        true
    }

    /// Note that `key` resolved. Returns true if this call fired.
    ///
    /// Each owner is counted once no matter how often it is reported; keys
    /// that are not owners, and every call after firing, are ignored.
    pub fn key_was_resolved<F>(&mut self, key: &K, resolver: F) -> bool
    where
        F: FnOnce(&K, &[K], &C, &Self),
    {
        if self.fired {
            return false;
        }
        let Some(position) = self.pending.iter().position(|owner| owner == key) else {
            return false;
        };
        self.pending.swap_remove(position);
        if !self.pending.is_empty() {
            return false;
        }
        self.fire(resolver);
        true
    }

    fn fire<F>(&mut self, resolver: F)
    where
        F: FnOnce(&K, &[K], &C, &Self),
    {
        self.fired = true;
        let this: &Self = self;
        resolver(&this.child, &this.owners, &this.context, this);
    }

    pub fn child_key(&self) -> &K {
        &self.child
    }

    /// Owners in construction order
    pub fn owner_keys(&self) -> &[K] {
        &self.owners
    }

    /// Owners not yet resolved
    pub fn pending_keys(&self) -> &[K] {
        &self.pending
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Number of distinct owners still unresolved
    pub fn unresolved_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn state(&self) -> TrackerState {
        if self.fired {
            TrackerState::Fired
        } else {
            TrackerState::Pending(self.pending.len())
        }
    }
}
