//! Order independence of ownership resolution
//!
//! The same set of key resolutions and child edges, applied in any order,
//! must resolve the same keys and fire the same edges.

mod common;

use common::random_heap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use refsearch::ownership::{Cascade, ChildResolver, StrongOwnershipSets};
use refsearch::{search_references, SearchOutcome};
use std::collections::BTreeSet;

#[derive(Default)]
struct Record {
    fired: BTreeSet<usize>,
}

impl ChildResolver<u32, usize> for Record {
    fn child_resolved(
        &mut self,
        child: &u32,
        _owners: &[u32],
        edge: &usize,
        cascade: &mut Cascade<u32>,
    ) {
        assert!(self.fired.insert(*edge), "edge {} fired twice", edge);
        cascade.resolve(*child);
    }
}

#[derive(Debug, Clone)]
enum Op {
    Resolve(u32),
    Edge { index: usize, child: u32, owners: Vec<u32> },
}

fn random_ops(rng: &mut StdRng, keys: u32, edges: usize) -> Vec<Op> {
    let mut ops: Vec<Op> = (0..3).map(|_| Op::Resolve(rng.gen_range(0..keys))).collect();
    for index in 0..edges {
        let owner_count = rng.gen_range(0..=3);
        let owners = (0..owner_count).map(|_| rng.gen_range(0..keys)).collect();
        ops.push(Op::Edge {
            index,
            child: rng.gen_range(0..keys),
            owners,
        });
    }
    ops
}

/// Fixpoint computed without the engine
fn expected(ops: &[Op]) -> (BTreeSet<u32>, BTreeSet<usize>) {
    let mut resolved: BTreeSet<u32> = ops
        .iter()
        .filter_map(|op| match op {
            Op::Resolve(key) => Some(*key),
            Op::Edge { .. } => None,
        })
        .collect();
    let mut fired = BTreeSet::new();
    loop {
        let mut changed = false;
        for op in ops {
            if let Op::Edge { index, child, owners } = op {
                if !fired.contains(index) && owners.iter().all(|o| resolved.contains(o)) {
                    fired.insert(*index);
                    resolved.insert(*child);
                    changed = true;
                }
            }
        }
        if !changed {
            return (resolved, fired);
        }
    }
}

fn apply(keys: u32, ops: &[Op]) -> (BTreeSet<u32>, BTreeSet<usize>) {
    let mut sets = StrongOwnershipSets::new(Record::default());
    for key in 0..keys {
        sets.define_key(key).unwrap();
    }
    for op in ops {
        match op {
            Op::Resolve(key) => sets.resolve_key(key).unwrap(),
            Op::Edge { index, child, owners } => {
                sets.define_child_edge(*child, owners.clone(), *index).unwrap();
            }
        }
    }
    let resolved = (0..keys).filter(|key| sets.is_resolved(key)).collect();
    (resolved, sets.into_resolver().fired)
}

#[test]
fn shuffled_operations_reach_the_same_fixpoint() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let keys = 12;
        let mut ops = random_ops(&mut rng, keys, 20);
        let oracle = expected(&ops);
        for _ in 0..10 {
            ops.shuffle(&mut rng);
            assert_eq!(apply(keys, &ops), oracle);
        }
    }
}

#[test]
fn search_verdict_ignores_root_order() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..30 {
        let fixture = random_heap(&mut rng, 15, 30);
        let mut roots = fixture.roots.clone();
        let baseline = search_references(&fixture.heap, &fixture.target, &roots, true)
            .unwrap()
            .is_found();
        for _ in 0..5 {
            roots.shuffle(&mut rng);
            let outcome = search_references(&fixture.heap, &fixture.target, &roots, true).unwrap();
            assert!(!matches!(outcome, SearchOutcome::Failed(_)));
            assert_eq!(outcome.is_found(), baseline);
        }
    }
}

#[test]
fn strong_verdict_implies_loose_verdict() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..30 {
        let fixture = random_heap(&mut rng, 15, 25);
        let (heap, target, roots) = (&fixture.heap, &fixture.target, &fixture.roots);
        let strict = search_references(heap, target, roots, true).unwrap();
        let loose = search_references(heap, target, roots, false).unwrap();
        if strict.is_found() {
            assert!(loose.is_found());
        }
    }
}
