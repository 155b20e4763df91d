//! ObjectGraphBuilder: worklist traversal that populates the reference graph
//!
//! Starting from the held roots, every discovered value is described once,
//! given a key in the ownership engine, and expanded through the
//! [`Introspector`]. Each non-weak reference is registered as a child edge the
//! moment it is found, so strong reachability resolves while traversal is
//! still running.

use super::config::SearchConfig;
use crate::graph::{
    BuiltinKind, Edge, EdgeIndex, EdgeKind, GraphError, GraphNode, ReferenceGraph, Strength,
    ValueId,
};
use crate::identity::IdentityRegistry;
use crate::introspect::{IntrospectionError, Introspector, RawEdge, StrengthHint};
use crate::ownership::{Cascade, ChildResolver, OwnershipError, StrongOwnershipSets};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors that stop traversal outright
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Contract(#[from] OwnershipError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Collaborator(#[from] IntrospectionError),
}

/// A reference whose strength the runtime could not classify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndeterminateEdge {
    pub parent_id: ValueId,
    pub child_id: ValueId,
    pub edge_kind: String,
    pub reason: String,
}

impl fmt::Display for IndeterminateEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}): {}",
            self.parent_id, self.child_id, self.edge_kind, self.reason
        )
    }
}

/// Every unclassified reference found during one traversal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} reference(s) could not be classified: {}", .edges.len(), join_edges(.edges))]
pub struct IndeterminateEdgesError {
    pub edges: Vec<IndeterminateEdge>,
}

fn join_edges(edges: &[IndeterminateEdge]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects fired edges and resolves their children
#[derive(Debug, Default)]
pub(crate) struct StrongEdgeLog {
    fired: Vec<EdgeIndex>,
}

impl ChildResolver<ValueId, EdgeIndex> for StrongEdgeLog {
    fn child_resolved(
        &mut self,
        child: &ValueId,
        _owners: &[ValueId],
        edge: &EdgeIndex,
        cascade: &mut Cascade<ValueId>,
    ) {
        self.fired.push(*edge);
        cascade.resolve(*child);
    }
}

/// Translate a runtime hint into the edge's frozen strength
///
/// Structural references are strong, weak-only containers hold weakly, and a
/// weak-keyed container holds each value jointly with the value's key.
fn classify(parent: ValueId, kind: &EdgeKind, hint: &StrengthHint) -> Result<Strength, String> {
    match hint {
        StrengthHint::Structural => Ok(Strength::Strong),
        StrengthHint::WeakOnly => Ok(Strength::Weak),
        StrengthHint::WeakKeyed => match kind {
            EdgeKind::CollectionKey => Ok(Strength::Weak),
            EdgeKind::CollectionValue { key } => Ok(Strength::JointlyConditional {
                owners: vec![parent, *key],
            }),
            other => Err(format!("weak-keyed hint on a {} reference", other.tag())),
        },
        StrengthHint::Unclassified { reason } => Err(reason.clone()),
    }
}

/// Position of a held root as an element index
fn element_index(position: usize) -> Result<u32, GraphError> {
    u32::try_from(position).map_err(|_| GraphError::IndexOverflow(position))
}

struct Pending<V> {
    value: V,
    id: ValueId,
    depth: usize,
}

/// Everything a finished traversal produced
#[derive(Debug)]
pub struct BuildOutput {
    pub graph: ReferenceGraph,
    /// The target's key resolved
    pub target_strongly_held: bool,
    /// A traversal limit cut expansion short
    pub truncated: bool,
    /// Number of values whose references were enumerated
    pub expanded: usize,
    pub indeterminate: Vec<IndeterminateEdge>,
}

/// Builds the reference graph for one search
pub struct ObjectGraphBuilder<'a, I: Introspector> {
    introspector: &'a I,
    config: &'a SearchConfig,
    registry: IdentityRegistry<I::Identity>,
    graph: ReferenceGraph,
    ownership: StrongOwnershipSets<ValueId, EdgeIndex, StrongEdgeLog>,
    worklist: VecDeque<Pending<I::Value>>,
    indeterminate: Vec<IndeterminateEdge>,
    expanded: usize,
    truncated: bool,
}

impl<'a, I: Introspector> ObjectGraphBuilder<'a, I> {
    /// Create a builder with fresh identity and ownership state
    pub fn new(introspector: &'a I, config: &'a SearchConfig) -> Self {
        Self {
            introspector,
            config,
            registry: IdentityRegistry::new(),
            graph: ReferenceGraph::new(),
            ownership: StrongOwnershipSets::new(StrongEdgeLog::default()),
            worklist: VecDeque::new(),
            indeterminate: Vec::new(),
            expanded: 0,
            truncated: false,
        }
    }

    /// Fix the reserved identities and connect the held roots
    ///
    /// The held-roots container is strongly held by definition. The target is
    /// given its reserved id but never expanded: no path through the target
    /// can prove the target reachable.
    pub fn seed(&mut self, target: &I::Value, held: &[I::Value]) -> Result<(), BuildError> {
        self.graph.add_node(GraphNode::new(
            ValueId::HeldValues,
            BuiltinKind::Array,
            "heldValues",
        ));
        self.ownership.define_key(ValueId::HeldValues)?;
        self.ownership.resolve_key(&ValueId::HeldValues)?;

        let identity = self.introspector.identity_of(target);
        self.registry.reserve(identity, ValueId::Target);
        let description = self.introspector.describe(target);
        self.graph.add_node(GraphNode::new(
            ValueId::Target,
            description.builtin_kind,
            description.label,
        ));
        self.ownership.define_key(ValueId::Target)?;

        for (index, root) in held.iter().enumerate() {
            let child = self.discover(root, 0)?;
            let index = element_index(index)?;
            self.connect(
                ValueId::HeldValues,
                child,
                EdgeKind::Element { index },
                Strength::Strong,
            )?;
        }
        debug!(roots = held.len(), "seeded search");
        Ok(())
    }

    /// Expand discovered values until the worklist empties or a limit hits
    pub fn run(&mut self) -> Result<(), BuildError> {
        while let Some(next) = self.worklist.pop_front() {
            if self.config.stop_when_found && self.is_strongly_held(&ValueId::Target) {
                debug!(expanded = self.expanded, "target strongly held, stopping early");
                self.worklist.clear();
                break;
            }
            if self.config.max_nodes.is_some_and(|max| self.expanded >= max) {
                warn!(expanded = self.expanded, "node limit reached, traversal truncated");
                self.truncated = true;
                self.worklist.clear();
                break;
            }
            if self.config.max_depth.is_some_and(|max| next.depth > max) {
                trace!(id = %next.id, depth = next.depth, "beyond depth limit");
                self.truncated = true;
                continue;
            }
            self.expand(next)?;
        }
        Ok(())
    }

    fn expand(&mut self, pending: Pending<I::Value>) -> Result<(), BuildError> {
        let Pending { value, id, depth } = pending;
        let mut raw_edges = self.introspector.edges_of(&value)?;
        if let Some(parts) = self.introspector.proxy_parts(&value) {
            raw_edges.push(RawEdge::structural(EdgeKind::ProxyTarget, parts.target));
            raw_edges.push(RawEdge::structural(EdgeKind::ProxyHandler, parts.handler));
        }
        self.expanded += 1;
        trace!(%id, depth, references = raw_edges.len(), "expanding value");

        for raw in raw_edges {
            self.add_raw_edge(id, depth + 1, raw)?;
        }
        Ok(())
    }

    fn add_raw_edge(
        &mut self,
        parent: ValueId,
        depth: usize,
        raw: RawEdge<I::Value>,
    ) -> Result<(), BuildError> {
        let RawEdge { kind, target, hint } = raw;
        let child = self.discover(&target, depth)?;
        let kind = kind.try_map_key(|key| self.discover(&key, depth))?;

        match classify(parent, &kind, &hint) {
            Ok(strength) => {
                let symbol = match &kind {
                    EdgeKind::SymbolKey { key } => Some((*key, strength.clone())),
                    _ => None,
                };
                self.connect(parent, child, kind, strength)?;
                // The property's symbol is held by the same reference
                match symbol {
                    Some((key, strength)) => {
                        self.connect(parent, key, EdgeKind::PropertyKey, strength)
                    }
                    None => Ok(()),
                }
            }
            Err(reason) => {
                warn!(%parent, %child, kind = kind.tag(), %reason, "unclassified reference");
                self.indeterminate.push(IndeterminateEdge {
                    parent_id: parent,
                    child_id: child,
                    edge_kind: kind.tag().to_string(),
                    reason,
                });
                Ok(())
            }
        }
    }

    /// Id for `value`, defining and queueing it on first sight
    fn discover(&mut self, value: &I::Value, depth: usize) -> Result<ValueId, BuildError> {
        let identity = self.introspector.identity_of(value);
        if let Some(id) = self.registry.lookup(&identity) {
            return Ok(id);
        }
        let id = self
            .registry
            .id_for(identity, self.introspector.category_of(value));
        let description = self.introspector.describe(value);
        self.graph
            .add_node(GraphNode::new(id, description.builtin_kind, description.label));
        self.ownership.define_key(id)?;
        self.worklist.push_back(Pending {
            value: value.clone(),
            id,
            depth,
        });
        Ok(id)
    }

    fn connect(
        &mut self,
        parent: ValueId,
        child: ValueId,
        kind: EdgeKind,
        strength: Strength,
    ) -> Result<(), BuildError> {
        let owners = strength.owners(parent);
        let index = self.graph.add_edge(Edge::new(parent, child, kind, strength))?;
        if let Some(owners) = owners {
            self.ownership.define_child_edge(child, owners, index)?;
        }
        self.apply_fired()
    }

    /// Copy fired trackers onto their edges
    fn apply_fired(&mut self) -> Result<(), BuildError> {
        let fired: Vec<EdgeIndex> = self.ownership.resolver_mut().fired.drain(..).collect();
        for index in fired {
            self.graph.mark_strong(index)?;
        }
        Ok(())
    }

    /// Whether `id` is known to be strongly held
    pub fn is_strongly_held(&self, id: &ValueId) -> bool {
        self.ownership.is_resolved(id)
    }

    pub fn finish(self) -> BuildOutput {
        let target_strongly_held = self.is_strongly_held(&ValueId::Target);
        debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            strong_edges = self.graph.strong_edge_count(),
            waiting_edges = self.ownership.pending_tracker_count(),
            target_strongly_held,
            "traversal finished"
        );
        BuildOutput {
            graph: self.graph,
            target_strongly_held,
            truncated: self.truncated,
            expanded: self.expanded,
            indeterminate: self.indeterminate,
        }
    }
}
