//! Search entry points
//!
//! Each search owns a fresh identity registry and ownership engine; nothing
//! carries over between calls.

use super::builder::{BuildError, IndeterminateEdgesError, ObjectGraphBuilder};
use super::config::SearchConfig;
use super::summarize::{EvidenceEdge, EvidenceGraph, EvidenceQuery};
use crate::graph::{GraphError, GraphNode, ValueId};
use crate::introspect::{IntrospectionError, Introspector};
use crate::ownership::OwnershipError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that indicate a bug rather than a property of the heap
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("ownership contract violated: {0}")]
    Contract(#[from] OwnershipError),

    #[error("reference graph inconsistent: {0}")]
    Graph(#[from] GraphError),
}

/// Why a search could not produce an answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error(transparent)]
    Indeterminate(#[from] IndeterminateEdgesError),

    #[error("introspection failed: {0}")]
    Collaborator(#[from] IntrospectionError),

    #[error(
        "traversal limit reached after expanding {expanded} value(s); target not proven reachable"
    )]
    Truncated { expanded: usize },
}

/// Answer to one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The target is reachable; the graph is the evidence
    Found(EvidenceGraph),
    /// Traversal completed and no qualifying path exists
    NotFound,
    Failed(FailureReason),
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchOutcome::Failed(_))
    }

    /// Evidence graph, if found
    pub fn into_graph(self) -> Option<EvidenceGraph> {
        match self {
            SearchOutcome::Found(graph) => Some(graph),
            _ => None,
        }
    }

    /// Flatten into the serializable report
    pub fn into_report(self) -> SearchReport {
        match self {
            SearchOutcome::Found(graph) => SearchReport {
                nodes: graph.nodes,
                edges: graph.edges,
                found: true,
                succeeded: true,
                error: None,
            },
            SearchOutcome::NotFound => SearchReport {
                nodes: Vec::new(),
                edges: Vec::new(),
                found: false,
                succeeded: true,
                error: None,
            },
            SearchOutcome::Failed(reason) => SearchReport {
                nodes: Vec::new(),
                edges: Vec::new(),
                found: false,
                succeeded: false,
                error: Some(reason.to_string()),
            },
        }
    }
}

/// Serializable search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<EvidenceEdge>,
    pub found: bool,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One target and its candidate roots
#[derive(Debug, Clone)]
pub struct SearchRequest<V> {
    pub target: V,
    pub held: Vec<V>,
}

impl<V> SearchRequest<V> {
    pub fn new(target: V, held: Vec<V>) -> Self {
        Self { target, held }
    }
}

/// Runs searches against one introspector
pub struct SearchDriver<'a, I: Introspector> {
    introspector: &'a I,
    config: SearchConfig,
}

impl<'a, I: Introspector> SearchDriver<'a, I> {
    pub fn new(introspector: &'a I) -> Self {
        Self {
            introspector,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Is `target` reachable from `held`?
    pub fn search(
        &self,
        target: &I::Value,
        held: &[I::Value],
    ) -> Result<SearchOutcome, SearchError> {
        debug!(
            roots = held.len(),
            strong_only = self.config.strong_only,
            "starting reference search"
        );
        let mut builder = ObjectGraphBuilder::new(self.introspector, &self.config);
        match builder.seed(target, held).and_then(|()| builder.run()) {
            Ok(()) => {}
            Err(BuildError::Collaborator(err)) => {
                warn!(error = %err, "introspection failed, abandoning search");
                return Ok(SearchOutcome::Failed(err.into()));
            }
            Err(BuildError::Contract(err)) => return Err(err.into()),
            Err(BuildError::Graph(err)) => return Err(err.into()),
        }

        let output = builder.finish();
        if !output.indeterminate.is_empty() {
            warn!(count = output.indeterminate.len(), "unclassified references");
            let error = IndeterminateEdgesError {
                edges: output.indeterminate,
            };
            return Ok(SearchOutcome::Failed(error.into()));
        }

        let evidence = EvidenceQuery::between(ValueId::HeldValues, ValueId::Target)
            .strong_only(self.config.strong_only)
            .execute(&output.graph);

        let outcome = if evidence.found {
            SearchOutcome::Found(evidence.graph)
        } else if output.truncated {
            SearchOutcome::Failed(FailureReason::Truncated {
                expanded: output.expanded,
            })
        } else {
            SearchOutcome::NotFound
        };
        info!(
            found = outcome.is_found(),
            nodes = output.graph.node_count(),
            edges = output.graph.edge_count(),
            "reference search complete"
        );
        Ok(outcome)
    }

    /// Run independent searches, each with fresh state
    pub fn search_batch(
        &self,
        requests: &[SearchRequest<I::Value>],
    ) -> Vec<Result<SearchOutcome, SearchError>> {
        requests
            .iter()
            .map(|request| self.search(&request.target, &request.held))
            .collect()
    }
}

/// Search with default limits
pub fn search_references<I: Introspector>(
    introspector: &I,
    target: &I::Value,
    held: &[I::Value],
    strong_only: bool,
) -> Result<SearchOutcome, SearchError> {
    search_with_config(
        introspector,
        target,
        held,
        SearchConfig::new().strong_only(strong_only),
    )
}

pub fn search_with_config<I: Introspector>(
    introspector: &I,
    target: &I::Value,
    held: &[I::Value],
    config: SearchConfig,
) -> Result<SearchOutcome, SearchError> {
    SearchDriver::new(introspector)
        .with_config(config)
        .search(target, held)
}

pub fn search_batch<I: Introspector>(
    introspector: &I,
    requests: &[SearchRequest<I::Value>],
    config: SearchConfig,
) -> Vec<Result<SearchOutcome, SearchError>> {
    SearchDriver::new(introspector)
        .with_config(config)
        .search_batch(requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ModelHeap;

    #[test]
    fn not_found_is_a_successful_report() {
        let mut heap = ModelHeap::new();
        let root = heap.object("Root");
        let target = heap.object("Target");

        let outcome = search_references(&heap, &target, &[root], true).unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);
        let report = outcome.into_report();
        assert!(report.succeeded);
        assert!(!report.found);
        assert!(report.error.is_none());
    }

    #[test]
    fn failure_report_carries_reason() {
        let mut heap = ModelHeap::new();
        let root = heap.object("Root");
        let target = heap.object("Target");
        heap.fail_on_inspect(root, "boom").unwrap();

        let outcome = search_references(&heap, &target, &[root], false).unwrap();
        assert!(outcome.is_failed());
        let report = outcome.into_report();
        assert!(!report.succeeded);
        assert!(report.error.unwrap().contains("boom"));
    }

    #[test]
    fn truncated_without_answer_fails() {
        let mut heap = ModelHeap::new();
        let root = heap.object("Root");
        let a = heap.object("A");
        let target = heap.object("Target");
        heap.set_property(root, "a", a).unwrap();
        heap.set_property(a, "t", target).unwrap();

        let outcome =
            search_with_config(&heap, &target, &[root], SearchConfig::new().max_nodes(1)).unwrap();
        assert_eq!(
            outcome,
            SearchOutcome::Failed(FailureReason::Truncated { expanded: 1 })
        );
    }

    #[test]
    fn target_is_its_own_root() {
        let mut heap = ModelHeap::new();
        let target = heap.object("Target");

        let outcome = search_references(&heap, &target, &[target], true).unwrap();
        let graph = outcome.into_graph().unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].edge.child, ValueId::Target);
    }

    #[test]
    fn report_serializes_in_camel_case() {
        let mut heap = ModelHeap::new();
        let root = heap.object("Root");
        let target = heap.object("Target");
        heap.set_property(root, "t", target).unwrap();

        let report = search_references(&heap, &target, &[root], true)
            .unwrap()
            .into_report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["found"], true);
        assert_eq!(json["succeeded"], true);
        assert!(json.get("error").is_none());
        let edge = &json["edges"][1];
        assert_eq!(edge["parentId"], "object:0");
        assert_eq!(edge["childId"], "target");
        assert_eq!(edge["edgeKind"], "property");
        assert_eq!(edge["name"], "t");
        assert_eq!(edge["isStrongReference"], true);
    }
}
