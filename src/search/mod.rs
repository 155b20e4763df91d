//! Reference search: traversal, resolution and evidence

mod builder;
mod config;
mod driver;
mod summarize;

pub(crate) use config::load_document;

pub use builder::{
    BuildError, BuildOutput, IndeterminateEdge, IndeterminateEdgesError, ObjectGraphBuilder,
};
pub use config::{ConfigError, SearchConfig};
pub use driver::{
    search_batch, search_references, search_with_config, FailureReason, SearchDriver,
    SearchError, SearchOutcome, SearchReport, SearchRequest,
};
pub use summarize::{EvidenceEdge, EvidenceGraph, EvidenceQuery, EvidenceResult};
