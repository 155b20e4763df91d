//! ReferenceGraph: arena of discovered values and the references between them

use super::edge::{Edge, EdgeIndex};
use super::node::{GraphNode, ValueId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when the graph is asked to do something its contents forbid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("edge endpoint {0} is not a node of the graph")]
    UnknownEndpoint(ValueId),

    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeIndex),

    #[error("element position {0} does not fit an element index")]
    IndexOverflow(usize),
}

/// Index-addressed storage for one search's reference graph
///
/// Nodes live in a table keyed by [`ValueId`]; edges live in an append-only
/// arena and refer to nodes by id only. Each edge carries one resolved bit,
/// set once its ownership tracker fires.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    nodes: Vec<GraphNode>,
    node_slots: HashMap<ValueId, usize>,
    edges: Vec<Edge>,
    strong: Vec<bool>,
    outgoing: HashMap<ValueId, Vec<EdgeIndex>>,
    incoming: HashMap<ValueId, Vec<EdgeIndex>>,
}

impl ReferenceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false if a node with the same id already exists.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.node_slots.contains_key(&node.id) {
            return false;
        }
        self.node_slots.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Append an edge between two existing nodes
    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeIndex, GraphError> {
        for endpoint in [edge.parent, edge.child] {
            if !self.contains_node(&endpoint) {
                return Err(GraphError::UnknownEndpoint(endpoint));
            }
        }
        let index = EdgeIndex(self.edges.len());
        self.outgoing.entry(edge.parent).or_default().push(index);
        self.incoming.entry(edge.child).or_default().push(index);
        self.edges.push(edge);
        self.strong.push(false);
        Ok(index)
    }

    /// Record that an edge's ownership resolved. Returns true on the first call.
    pub fn mark_strong(&mut self, index: EdgeIndex) -> Result<bool, GraphError> {
        let slot = self
            .strong
            .get_mut(index.0)
            .ok_or(GraphError::UnknownEdge(index))?;
        let newly = !*slot;
        *slot = true;
        Ok(newly)
    }

    /// Whether the edge's ownership resolved, i.e. it keeps its child alive
    pub fn is_strong_reference(&self, index: EdgeIndex) -> bool {
        self.strong.get(index.0).copied().unwrap_or(false)
    }

    /// Check if a node exists
    pub fn contains_node(&self, id: &ValueId) -> bool {
        self.node_slots.contains_key(id)
    }

    /// Get a node by id
    pub fn get_node(&self, id: &ValueId) -> Option<&GraphNode> {
        self.node_slots.get(id).map(|&slot| &self.nodes[slot])
    }

    /// Get an edge by index
    pub fn get_edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.0)
    }

    /// Edges whose child is `id`
    pub fn incoming(&self, id: &ValueId) -> &[EdgeIndex] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges whose parent is `id`
    pub fn outgoing(&self, id: &ValueId) -> &[EdgeIndex] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes in discovery order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// All edges in discovery order
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(slot, edge)| (EdgeIndex(slot), edge))
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of edges whose ownership resolved
    pub fn strong_edge_count(&self) -> usize {
        self.strong.iter().filter(|&&strong| strong).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuiltinKind, EdgeKind};

    fn node(id: ValueId) -> GraphNode {
        GraphNode::new(id, BuiltinKind::Object, "Object")
    }

    #[test]
    fn test_add_node_is_idempotent_per_id() {
        let mut graph = ReferenceGraph::new();
        assert!(graph.add_node(node(ValueId::Object(0))));
        assert!(!graph.add_node(GraphNode::new(ValueId::Object(0), BuiltinKind::Array, "Array")));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(
            graph.get_node(&ValueId::Object(0)).map(|n| n.builtin_kind),
            Some(BuiltinKind::Object)
        );
    }

    #[test]
    fn test_add_edge_requires_both_endpoints() {
        let mut graph = ReferenceGraph::new();
        graph.add_node(node(ValueId::Object(0)));
        let result = graph.add_edge(Edge::strong(
            ValueId::Object(0),
            ValueId::Object(1),
            EdgeKind::Prototype,
        ));
        assert_eq!(result, Err(GraphError::UnknownEndpoint(ValueId::Object(1))));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edges_are_indexed_both_ways() {
        let mut graph = ReferenceGraph::new();
        graph.add_node(node(ValueId::Object(0)));
        graph.add_node(node(ValueId::Object(1)));
        let a = graph
            .add_edge(Edge::strong(ValueId::Object(0), ValueId::Object(1), EdgeKind::Prototype))
            .unwrap();
        let b = graph
            .add_edge(Edge::weak(ValueId::Object(0), ValueId::Object(1), EdgeKind::WeakRefTarget))
            .unwrap();

        assert_eq!(graph.outgoing(&ValueId::Object(0)), &[a, b]);
        assert_eq!(graph.incoming(&ValueId::Object(1)), &[a, b]);
        assert!(graph.incoming(&ValueId::Object(0)).is_empty());
    }

    #[test]
    fn test_mark_strong_is_monotonic() {
        let mut graph = ReferenceGraph::new();
        graph.add_node(node(ValueId::Object(0)));
        graph.add_node(node(ValueId::Object(1)));
        let edge = graph
            .add_edge(Edge::strong(ValueId::Object(0), ValueId::Object(1), EdgeKind::Prototype))
            .unwrap();

        assert!(!graph.is_strong_reference(edge));
        assert_eq!(graph.mark_strong(edge), Ok(true));
        assert_eq!(graph.mark_strong(edge), Ok(false));
        assert!(graph.is_strong_reference(edge));
        assert_eq!(graph.strong_edge_count(), 1);
    }

    #[test]
    fn test_mark_strong_unknown_edge() {
        let mut graph = ReferenceGraph::new();
        assert_eq!(
            graph.mark_strong(EdgeIndex(3)),
            Err(GraphError::UnknownEdge(EdgeIndex(3)))
        );
    }
}
