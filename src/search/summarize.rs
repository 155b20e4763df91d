//! Evidence extraction
//!
//! Prunes a finished reference graph down to the references that lie on some
//! path from the held roots to the target.

use crate::graph::{Edge, EdgeIndex, GraphNode, ReferenceGraph, Strength, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// An edge in the evidence graph, with its resolved strength
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEdge {
    #[serde(flatten)]
    pub edge: Edge,
    pub is_strong_reference: bool,
}

/// Minimal subgraph explaining why the target is reachable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EvidenceEdge>,
}

impl EvidenceGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains_node(&self, id: &ValueId) -> bool {
        self.nodes.iter().any(|node| node.id == *id)
    }

    /// Edges from `parent` to `child`
    pub fn edges_between<'a>(
        &'a self,
        parent: ValueId,
        child: ValueId,
    ) -> impl Iterator<Item = &'a EvidenceEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.edge.parent == parent && e.edge.child == child)
    }
}

/// Result of an evidence query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceResult {
    pub found: bool,
    pub graph: EvidenceGraph,
}

/// Query for the evidence connecting a root to a target
#[derive(Debug, Clone)]
pub struct EvidenceQuery {
    pub source: ValueId,
    pub target: ValueId,
    /// Only edges resolved as strong qualify
    pub strong_only: bool,
}

impl EvidenceQuery {
    pub fn between(source: ValueId, target: ValueId) -> Self {
        Self {
            source,
            target,
            strong_only: false,
        }
    }

    pub fn strong_only(mut self, strong_only: bool) -> Self {
        self.strong_only = strong_only;
        self
    }

    fn qualifies(&self, graph: &ReferenceGraph, index: EdgeIndex) -> bool {
        !self.strong_only || graph.is_strong_reference(index)
    }

    /// Run the backward sweep from the target
    pub fn execute(&self, graph: &ReferenceGraph) -> EvidenceResult {
        if !graph.contains_node(&self.source) || !graph.contains_node(&self.target) {
            return EvidenceResult {
                found: false,
                graph: EvidenceGraph::default(),
            };
        }

        let forward = self.forward_reach(graph);
        if !forward.contains(&self.target) {
            return EvidenceResult {
                found: false,
                graph: EvidenceGraph::default(),
            };
        }

        let mut needed: HashSet<ValueId> = HashSet::new();
        let mut queue: VecDeque<ValueId> = VecDeque::new();
        let mut kept: BTreeSet<EdgeIndex> = BTreeSet::new();
        needed.insert(self.target);
        queue.push_back(self.target);

        while let Some(child) = queue.pop_front() {
            for &index in graph.incoming(&child) {
                if !self.qualifies(graph, index) {
                    continue;
                }
                let Some(edge) = graph.get_edge(index) else {
                    continue;
                };
                if !forward.contains(&edge.parent) || !kept.insert(index) {
                    continue;
                }
                let mut seeds = vec![edge.parent];
                // A joint edge is only justified once every owner is
                if self.strong_only {
                    if let Strength::JointlyConditional { owners } = &edge.strength {
                        seeds.extend(owners.iter().copied());
                    }
                }
                for seed in seeds {
                    if needed.insert(seed) {
                        queue.push_back(seed);
                    }
                }
            }
        }

        let mut nodes: Vec<GraphNode> = needed
            .iter()
            .filter_map(|id| graph.get_node(id).cloned())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let edges = kept
            .into_iter()
            .filter_map(|index| {
                graph.get_edge(index).map(|edge| EvidenceEdge {
                    edge: edge.clone(),
                    is_strong_reference: graph.is_strong_reference(index),
                })
            })
            .collect();

        EvidenceResult {
            found: true,
            graph: EvidenceGraph { nodes, edges },
        }
    }

    fn forward_reach(&self, graph: &ReferenceGraph) -> HashSet<ValueId> {
        let mut visited: HashSet<ValueId> = HashSet::new();
        let mut queue: VecDeque<ValueId> = VecDeque::new();
        visited.insert(self.source);
        queue.push_back(self.source);

        while let Some(current) = queue.pop_front() {
            for &index in graph.outgoing(&current) {
                if !self.qualifies(graph, index) {
                    continue;
                }
                if let Some(edge) = graph.get_edge(index) {
                    if visited.insert(edge.child) {
                        queue.push_back(edge.child);
                    }
                }
            }
        }
        visited
    }
}
