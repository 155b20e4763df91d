//! Refsearch: strong-reachability search over a runtime's object graph
//!
//! Given a target value and a set of held roots, builds the graph of
//! references between them and decides whether the target is kept alive by
//! the roots, returning the minimal evidence graph when it is.
//!
//! # Core Concepts
//!
//! - **Reference graph**: every discovered value and reference, with each
//!   reference's strength frozen when it is found
//! - **Ownership resolution**: a value is strongly held once some reference
//!   to it has all of its owners strongly held; joint references (weak-keyed
//!   collection entries) need every owner
//! - **Introspector**: the read-only boundary to the runtime being analyzed
//!
//! # Example
//!
//! ```
//! use refsearch::{search_references, ModelHeap, SearchOutcome};
//!
//! let mut heap = ModelHeap::new();
//! let root = heap.object("Root");
//! let target = heap.object("Target");
//! heap.set_property(root, "child", target).unwrap();
//!
//! let outcome = search_references(&heap, &target, &[root], true).unwrap();
//! assert!(matches!(outcome, SearchOutcome::Found(_)));
//! ```

pub mod graph;
pub mod heap;
pub mod identity;
pub mod introspect;
pub mod ownership;
pub mod search;

pub use graph::{
    BuiltinKind, Edge, EdgeIndex, EdgeKind, GraphError, GraphNode, ReferenceGraph, Strength,
    ValueId,
};
pub use heap::{HeapRef, HeapSpec, HeapSpecError, LoadedHeap, ModelHeap};
pub use identity::{IdentityRegistry, ValueCategory};
pub use introspect::{
    IntrospectionError, Introspector, NodeDescription, ProxyParts, RawEdge, StrengthHint,
};
pub use ownership::{
    ChildResolver, JointOwnershipTracker, KeyResolutions, OwnershipError, StrongOwnershipSets,
};
pub use search::{
    search_batch, search_references, search_with_config, ConfigError, EvidenceGraph,
    FailureReason, SearchConfig, SearchDriver, SearchError, SearchOutcome, SearchReport,
    SearchRequest,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
