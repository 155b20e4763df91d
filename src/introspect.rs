//! Boundary to the runtime being analyzed
//!
//! The search never evaluates guest code. Everything it knows about values
//! comes through an [`Introspector`], which reports identities, shapes and
//! outgoing references.

use crate::graph::{BuiltinKind, EdgeKind};
use crate::identity::ValueCategory;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Errors raised by the introspection layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectionError {
    #[error("guest evaluation failed while inspecting {value}: {message}")]
    Evaluation { value: String, message: String },

    #[error("value {0} is no longer available")]
    Stale(String),
}

/// How the runtime classifies a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrengthHint {
    /// Ordinary structure: properties, slots, captures, prototypes
    Structural,
    /// Held by a container that never retains its contents
    WeakOnly,
    /// Held by a container that retains values only while their key lives
    WeakKeyed,
    /// The runtime could not say
    Unclassified { reason: String },
}

/// One outgoing reference as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdge<V> {
    pub kind: EdgeKind<V>,
    pub target: V,
    pub hint: StrengthHint,
}

impl<V> RawEdge<V> {
    pub fn new(kind: EdgeKind<V>, target: V, hint: StrengthHint) -> Self {
        Self { kind, target, hint }
    }

    pub fn structural(kind: EdgeKind<V>, target: V) -> Self {
        Self::new(kind, target, StrengthHint::Structural)
    }
}

/// Shape and label of a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescription {
    pub builtin_kind: BuiltinKind,
    pub label: String,
}

impl NodeDescription {
    pub fn new(builtin_kind: BuiltinKind, label: impl Into<String>) -> Self {
        Self {
            builtin_kind,
            label: label.into(),
        }
    }
}

/// The two halves of a live forwarding wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyParts<V> {
    pub target: V,
    pub handler: V,
}

/// Read-only view of a runtime's heap
pub trait Introspector {
    /// Handle to a guest value
    type Value: Clone;

    /// Token naming a value without keeping it alive
    type Identity: Copy + Eq + Hash + fmt::Debug;

    /// Stable identity token for `value`
    fn identity_of(&self, value: &Self::Value) -> Self::Identity;

    /// Namespace the value's id is drawn from
    fn category_of(&self, value: &Self::Value) -> ValueCategory;

    /// Built-in shape and a human label
    fn describe(&self, value: &Self::Value) -> NodeDescription;

    /// Outgoing references of `value`. Called at most once per value per search.
    fn edges_of(
        &self,
        value: &Self::Value,
    ) -> Result<Vec<RawEdge<Self::Value>>, IntrospectionError>;

    /// Target and handler of a forwarding wrapper; `None` if `value` is not
    /// one or has been revoked
    fn proxy_parts(&self, _value: &Self::Value) -> Option<ProxyParts<Self::Value>> {
        None
    }
}
