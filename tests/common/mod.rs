//! Common test utilities for reference search integration tests
//!
//! Heap fixtures shared across the scenario, confluence and loading suites.

pub mod fixtures;

pub use fixtures::{edge_tags, random_heap, strong_chain, weak_cache, RandomHeap, WeakCache};
