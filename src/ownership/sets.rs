//! StrongOwnershipSets: cascading resolution over many joint trackers
//!
//! Keys are defined as values are discovered and resolved once they are known
//! to be strongly held. Every conditional edge gets a
//! [`JointOwnershipTracker`] indexed under its pending owners. Resolving a key
//! notifies the trackers waiting on it; each tracker that fires hands its edge
//! to the outer [`ChildResolver`], which may ask for further resolutions. Those
//! run to quiescence before the call that triggered them returns.

use super::error::{OwnershipError, OwnershipResult};
use super::joint::JointOwnershipTracker;
use super::keys::KeyResolutions;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use tracing::trace;

/// Keys queued for resolution by a resolver
#[derive(Debug)]
pub struct Cascade<K> {
    queue: VecDeque<K>,
}

impl<K> Cascade<K> {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Resolve `key` once the current notification finishes
    pub fn resolve(&mut self, key: K) {
        self.queue.push_back(key);
    }

    /// Number of keys waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Receives every fired tracker
pub trait ChildResolver<K, C> {
    /// Called exactly once per tracker, with owners in construction order
    fn child_resolved(&mut self, child: &K, owners: &[K], context: &C, cascade: &mut Cascade<K>);
}

impl<K, C, F> ChildResolver<K, C> for F
where
    F: FnMut(&K, &[K], &C, &mut Cascade<K>),
{
    fn child_resolved(&mut self, child: &K, owners: &[K], context: &C, cascade: &mut Cascade<K>) {
        self(child, owners, context, cascade)
    }
}

/// Handle to a tracker that is still waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackerId(usize);

/// Outcome of registering a child edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRegistration {
    /// All owners were already resolved; the resolver has run
    Fired,
    /// Waiting on at least one owner
    Pending(TrackerId),
}

/// The aggregate ownership engine for one search
pub struct StrongOwnershipSets<K, C, R> {
    keys: KeyResolutions<K>,
    trackers: HashMap<TrackerId, JointOwnershipTracker<K, C>>,
    owner_index: HashMap<K, Vec<TrackerId>>,
    next_tracker: usize,
    fired: usize,
    resolver: R,
}

impl<K, C, R> StrongOwnershipSets<K, C, R>
where
    K: Clone + Eq + Hash + Display,
    R: ChildResolver<K, C>,
{
    /// Create an engine that reports fired trackers to `resolver`
    pub fn new(resolver: R) -> Self {
        Self {
            keys: KeyResolutions::new(),
            trackers: HashMap::new(),
            owner_index: HashMap::new(),
            next_tracker: 0,
            fired: 0,
            resolver,
        }
    }

    /// Define `key` as known but not yet strongly held
    pub fn define_key(&mut self, key: K) -> OwnershipResult<()> {
        self.keys.define(key)
    }

    /// Mark `key` strongly held and run the resulting cascade to quiescence
    pub fn resolve_key(&mut self, key: &K) -> OwnershipResult<()> {
        if !self.keys.is_defined(key) {
            return Err(OwnershipError::KeyNotDefined(key.to_string()));
        }
        let mut cascade = Cascade::new();
        cascade.resolve(key.clone());
        self.run_cascade(cascade)
    }

    /// Register an edge to `child` that counts once every owner is resolved
    pub fn define_child_edge(
        &mut self,
        child: K,
        owners: Vec<K>,
        context: C,
    ) -> OwnershipResult<EdgeRegistration> {
        if !self.keys.is_defined(&child) {
            return Err(OwnershipError::ChildKeyNotDefined(child.to_string()));
        }
        if let Some(missing) = owners.iter().find(|owner| !self.keys.is_defined(owner)) {
            return Err(OwnershipError::OwnerKeyNotDefined(missing.to_string()));
        }

        let mut tracker = JointOwnershipTracker::new(child, owners, context, &self.keys);
        let mut cascade = Cascade::new();
        let resolver = &mut self.resolver;
        let fired = tracker.fire_callback_if_empty(|child, owners, context, _| {
            resolver.child_resolved(child, owners, context, &mut cascade)
        });
        if fired {
            self.fired += 1;
            self.run_cascade(cascade)?;
            return Ok(EdgeRegistration::Fired);
        }

        let id = TrackerId(self.next_tracker);
        self.next_tracker += 1;
        for owner in tracker.pending_keys() {
            self.owner_index.entry(owner.clone()).or_default().push(id);
        }
        trace!(
            child = %tracker.child_key(),
            pending = tracker.unresolved_count(),
            "child edge waiting on owners"
        );
        self.trackers.insert(id, tracker);
        Ok(EdgeRegistration::Pending(id))
    }

    /// Resolve queued keys until nothing more fires
    ///
    /// A key's index entry is taken out of the map before its trackers are
    /// notified, so resolvers can queue more work without touching the list
    /// being walked.
    fn run_cascade(&mut self, mut cascade: Cascade<K>) -> OwnershipResult<()> {
        while let Some(key) = cascade.queue.pop_front() {
            if !self.keys.resolve(&key)? {
                continue;
            }
            trace!(key = %key, "key resolved");

            let Some(waiting) = self.owner_index.remove(&key) else {
                continue;
            };
            for id in waiting {
                let Some(tracker) = self.trackers.get_mut(&id) else {
                    continue;
                };
                let resolver = &mut self.resolver;
                let fired = tracker.key_was_resolved(&key, |child, owners, context, _| {
                    resolver.child_resolved(child, owners, context, &mut cascade)
                });
                if fired {
                    self.trackers.remove(&id);
                    self.fired += 1;
                }
            }
        }
        Ok(())
    }

    pub fn is_defined(&self, key: &K) -> bool {
        self.keys.is_defined(key)
    }

    pub fn is_resolved(&self, key: &K) -> bool {
        self.keys.is_resolved(key)
    }

    /// Number of defined keys
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Number of resolved keys
    pub fn resolved_count(&self) -> usize {
        self.keys.resolved_count()
    }

    /// Trackers still waiting on at least one owner
    pub fn pending_tracker_count(&self) -> usize {
        self.trackers.len()
    }

    /// Trackers that have fired so far
    pub fn fired_tracker_count(&self) -> usize {
        self.fired
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    /// Consume the engine, returning the resolver
    pub fn into_resolver(self) -> R {
        self.resolver
    }
}
