//! Heap fixtures
//!
//! Small hand-built heaps for the shapes the search must handle.

#![allow(dead_code)]

use rand::Rng;
use refsearch::{BuiltinKind, EvidenceGraph, HeapRef, ModelHeap};

/// A weak-keyed cache whose only entry maps `key` to `target`
pub struct WeakCache {
    pub heap: ModelHeap,
    pub cache: HeapRef,
    pub key: HeapRef,
    pub target: HeapRef,
}

pub fn weak_cache() -> WeakCache {
    let mut heap = ModelHeap::new();
    let cache = heap.alloc(BuiltinKind::WeakMap, "WeakMap");
    let key = heap.object("Session");
    let target = heap.object("Token");
    heap.map_set(cache, key, target).unwrap();
    WeakCache {
        heap,
        cache,
        key,
        target,
    }
}

/// `root -> v1 -> ... -> target`, all by plain properties
///
/// Returns the heap, the root and the target.
pub fn strong_chain(links: usize) -> (ModelHeap, HeapRef, HeapRef) {
    let mut heap = ModelHeap::new();
    let root = heap.object("Root");
    let mut current = root;
    for i in 0..links {
        let next = heap.object(format!("Link{}", i));
        heap.set_property(current, "next", next).unwrap();
        current = next;
    }
    let target = heap.object("Target");
    heap.set_property(current, "next", target).unwrap();
    (heap, root, target)
}

/// Randomly wired heap mixing strong, weak and weak-keyed references
pub struct RandomHeap {
    pub heap: ModelHeap,
    pub values: Vec<HeapRef>,
    pub roots: Vec<HeapRef>,
    pub target: HeapRef,
}

pub fn random_heap<R: Rng>(rng: &mut R, size: usize, references: usize) -> RandomHeap {
    let mut heap = ModelHeap::new();
    let mut values = Vec::with_capacity(size);
    for i in 0..size {
        let value = match i % 5 {
            0 => heap.alloc(BuiltinKind::WeakMap, format!("WeakMap{}", i)),
            1 => heap.alloc(BuiltinKind::WeakSet, format!("WeakSet{}", i)),
            _ => heap.object(format!("Object{}", i)),
        };
        values.push(value);
    }

    for n in 0..references {
        let from = values[rng.gen_range(0..size)];
        let to = values[rng.gen_range(0..size)];
        match heap.kind_of(from) {
            Some(BuiltinKind::WeakMap) => {
                let key = values[rng.gen_range(0..size)];
                heap.map_set(from, key, to).unwrap();
            }
            Some(BuiltinKind::WeakSet) => heap.set_add(from, to).unwrap(),
            _ => heap.set_property(from, format!("p{}", n), to).unwrap(),
        }
    }

    let target = values[size - 1];
    let roots = values.iter().copied().take(3).collect();
    RandomHeap {
        heap,
        values,
        roots,
        target,
    }
}

/// Edge-kind tags of an evidence graph, in edge order
pub fn edge_tags(graph: &EvidenceGraph) -> Vec<&'static str> {
    graph.edges.iter().map(|e| e.edge.kind.tag()).collect()
}
