//! Core reference graph data structures

mod edge;
mod node;
mod reference_graph;


pub use edge::{Edge, EdgeIndex, EdgeKind, Strength};
pub use node::{BuiltinKind, GraphNode, ParseValueIdError, ValueId};
pub use reference_graph::{GraphError, ReferenceGraph};
