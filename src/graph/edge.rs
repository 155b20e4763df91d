//! Edge representation with frozen reference strength

use super::node::ValueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an edge in the reference graph's arena
///
/// Doubles as the context carried by the edge's ownership tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeIndex(pub(crate) usize);

impl EdgeIndex {
    /// Arena slot of this edge
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reference:{}", self.0)
    }
}

/// How a parent value refers to a child value
///
/// `K` is the representation of values named by the edge itself (the symbol
/// of a symbol-keyed property, the key of a collection entry). The
/// introspection layer reports edges over its own value handles; the graph
/// stores them over [`ValueId`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "edgeKind", rename_all = "camelCase")]
pub enum EdgeKind<K = ValueId> {
    /// String-named own property
    Property { name: String },
    /// Indexed element of an array-like value
    Element { index: u32 },
    /// Property keyed by a symbol value
    SymbolKey { key: K },
    /// The symbol naming a symbol-keyed property
    PropertyKey,
    /// Class private field (`#name`)
    PrivateField { name: String },
    /// Engine-internal slot such as `[[Prototype]]` or `[[BoundThis]]`
    InternalSlot { slot: String },
    /// Variable captured by a closure
    ClosureCapture { name: String },
    Prototype,
    ConstructorOf,
    /// A key held by a keyed collection
    CollectionKey,
    /// The value stored under `key` in a keyed collection
    CollectionValue { key: K },
    /// A member of a set-like collection
    CollectionElement,
    ProxyTarget,
    ProxyHandler,
    WeakRefTarget,
    FinalizerCallback,
    FinalizerTarget,
    FinalizerHeldValue,
    FinalizerUnregisterToken,
}

impl<K> EdgeKind<K> {
    /// Stable tag naming this edge kind
    pub fn tag(&self) -> &'static str {
        match self {
            EdgeKind::Property { .. } => "property",
            EdgeKind::Element { .. } => "element",
            EdgeKind::SymbolKey { .. } => "symbolKey",
            EdgeKind::PropertyKey => "propertyKey",
            EdgeKind::PrivateField { .. } => "privateField",
            EdgeKind::InternalSlot { .. } => "internalSlot",
            EdgeKind::ClosureCapture { .. } => "closureCapture",
            EdgeKind::Prototype => "prototype",
            EdgeKind::ConstructorOf => "constructorOf",
            EdgeKind::CollectionKey => "collectionKey",
            EdgeKind::CollectionValue { .. } => "collectionValue",
            EdgeKind::CollectionElement => "collectionElement",
            EdgeKind::ProxyTarget => "proxyTarget",
            EdgeKind::ProxyHandler => "proxyHandler",
            EdgeKind::WeakRefTarget => "weakRefTarget",
            EdgeKind::FinalizerCallback => "finalizerCallback",
            EdgeKind::FinalizerTarget => "finalizerTarget",
            EdgeKind::FinalizerHeldValue => "finalizerHeldValue",
            EdgeKind::FinalizerUnregisterToken => "finalizerUnregisterToken",
        }
    }

    /// The value named by the edge, if the kind carries one
    pub fn key(&self) -> Option<&K> {
        match self {
            EdgeKind::SymbolKey { key } | EdgeKind::CollectionValue { key } => Some(key),
            _ => None,
        }
    }

    /// Translate the carried key, leaving every other field untouched
    pub fn try_map_key<W, E>(self, f: impl FnOnce(K) -> Result<W, E>) -> Result<EdgeKind<W>, E> {
        Ok(match self {
            EdgeKind::Property { name } => EdgeKind::Property { name },
            EdgeKind::Element { index } => EdgeKind::Element { index },
            EdgeKind::SymbolKey { key } => EdgeKind::SymbolKey { key: f(key)? },
            EdgeKind::PropertyKey => EdgeKind::PropertyKey,
            EdgeKind::PrivateField { name } => EdgeKind::PrivateField { name },
            EdgeKind::InternalSlot { slot } => EdgeKind::InternalSlot { slot },
            EdgeKind::ClosureCapture { name } => EdgeKind::ClosureCapture { name },
            EdgeKind::Prototype => EdgeKind::Prototype,
            EdgeKind::ConstructorOf => EdgeKind::ConstructorOf,
            EdgeKind::CollectionKey => EdgeKind::CollectionKey,
            EdgeKind::CollectionValue { key } => EdgeKind::CollectionValue { key: f(key)? },
            EdgeKind::CollectionElement => EdgeKind::CollectionElement,
            EdgeKind::ProxyTarget => EdgeKind::ProxyTarget,
            EdgeKind::ProxyHandler => EdgeKind::ProxyHandler,
            EdgeKind::WeakRefTarget => EdgeKind::WeakRefTarget,
            EdgeKind::FinalizerCallback => EdgeKind::FinalizerCallback,
            EdgeKind::FinalizerTarget => EdgeKind::FinalizerTarget,
            EdgeKind::FinalizerHeldValue => EdgeKind::FinalizerHeldValue,
            EdgeKind::FinalizerUnregisterToken => EdgeKind::FinalizerUnregisterToken,
        })
    }
}

/// Whether an edge keeps its child alive
///
/// Fixed when the edge is created and never re-interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strength {
    /// Keeps the child alive while the parent is alive
    Strong,
    /// Never keeps the child alive
    Weak,
    /// Keeps the child alive only while every owner is alive
    JointlyConditional { owners: Vec<ValueId> },
}

impl Strength {
    /// Keys that must all be strongly held for an edge from `parent` to count
    ///
    /// `None` for weak edges, which never count.
    pub fn owners(&self, parent: ValueId) -> Option<Vec<ValueId>> {
        match self {
            Strength::Strong => Some(vec![parent]),
            Strength::Weak => None,
            Strength::JointlyConditional { owners } => Some(owners.clone()),
        }
    }
}

/// A directed reference from a parent value to a child value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(rename = "parentId")]
    pub parent: ValueId,
    #[serde(rename = "childId")]
    pub child: ValueId,
    #[serde(flatten)]
    pub kind: EdgeKind,
    pub strength: Strength,
}

impl Edge {
    /// Create a new edge
    pub fn new(parent: ValueId, child: ValueId, kind: EdgeKind, strength: Strength) -> Self {
        Self {
            parent,
            child,
            kind,
            strength,
        }
    }

    /// Create a strong edge
    pub fn strong(parent: ValueId, child: ValueId, kind: EdgeKind) -> Self {
        Self::new(parent, child, kind, Strength::Strong)
    }

    /// Create a weak edge
    pub fn weak(parent: ValueId, child: ValueId, kind: EdgeKind) -> Self {
        Self::new(parent, child, kind, Strength::Weak)
    }

    /// Keys whose joint resolution makes this edge count toward reachability
    pub fn owners(&self) -> Option<Vec<ValueId>> {
        self.strength.owners(self.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_edge_is_owned_by_its_parent() {
        let edge = Edge::strong(
            ValueId::Object(1),
            ValueId::Object(2),
            EdgeKind::Property { name: "next".into() },
        );
        assert_eq!(edge.owners(), Some(vec![ValueId::Object(1)]));
    }

    #[test]
    fn weak_edge_has_no_owners() {
        let edge = Edge::weak(ValueId::Object(1), ValueId::Object(2), EdgeKind::WeakRefTarget);
        assert_eq!(edge.owners(), None);
    }

    #[test]
    fn joint_owners_are_kept_in_order() {
        let edge = Edge::new(
            ValueId::Object(5),
            ValueId::Object(9),
            EdgeKind::CollectionValue { key: ValueId::Object(7) },
            Strength::JointlyConditional {
                owners: vec![ValueId::Object(5), ValueId::Object(7)],
            },
        );
        assert_eq!(edge.owners(), Some(vec![ValueId::Object(5), ValueId::Object(7)]));
    }

    #[test]
    fn try_map_key_translates_only_the_key() {
        let raw: EdgeKind<&str> = EdgeKind::CollectionValue { key: "k" };
        let mapped: Result<EdgeKind<ValueId>, ()> = raw.try_map_key(|_| Ok(ValueId::Symbol(4)));
        assert_eq!(
            mapped,
            Ok(EdgeKind::CollectionValue { key: ValueId::Symbol(4) })
        );

        let plain: EdgeKind<&str> = EdgeKind::Property { name: "x".into() };
        let mapped: Result<EdgeKind<ValueId>, ()> = plain.try_map_key(|_| Err(()));
        assert_eq!(mapped, Ok(EdgeKind::Property { name: "x".into() }));
    }

    #[test]
    fn edge_index_displays_as_reference() {
        assert_eq!(EdgeIndex(87).to_string(), "reference:87");
    }
}
