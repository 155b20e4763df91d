//! Model heap: a hand-built runtime for tests, demos and the CLI

mod model;
mod spec;

pub use model::{HeapError, HeapRef, ModelHeap};
pub use spec::{HeapSpec, HeapSpecError, LoadedHeap, ReferenceSpec, ValueSpec};
