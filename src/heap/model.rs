//! In-memory heap that implements [`Introspector`]

use crate::graph::{BuiltinKind, EdgeKind};
use crate::identity::ValueCategory;
use crate::introspect::{
    IntrospectionError, Introspector, NodeDescription, ProxyParts, RawEdge, StrengthHint,
};
use std::fmt;
use thiserror::Error;

/// Handle to a value in a [`ModelHeap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapRef(usize);

impl HeapRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for HeapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "heap#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("{0} is not a value of this heap")]
    UnknownRef(HeapRef),

    #[error("{value} is a {kind}, which does not support {operation}")]
    WrongKind {
        value: HeapRef,
        kind: BuiltinKind,
        operation: &'static str,
    },

    #[error("{0} has more elements than an element index can address")]
    TooManyElements(HeapRef),
}

#[derive(Debug, Clone)]
struct Cell {
    kind: BuiltinKind,
    label: String,
    edges: Vec<RawEdge<HeapRef>>,
    proxy: Option<ProxyParts<HeapRef>>,
    failure: Option<String>,
}

fn next_element_index(array: HeapRef, count: usize) -> Result<u32, HeapError> {
    u32::try_from(count).map_err(|_| HeapError::TooManyElements(array))
}

/// A hand-built heap of guest values
///
/// Mutators mirror the guest operations that create references, and pick the
/// strength hint the real runtime would report for them.
#[derive(Debug, Clone, Default)]
pub struct ModelHeap {
    cells: Vec<Cell>,
}

impl ModelHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Allocate a value with no outgoing references
    pub fn alloc(&mut self, kind: BuiltinKind, label: impl Into<String>) -> HeapRef {
        let handle = HeapRef(self.cells.len());
        self.cells.push(Cell {
            kind,
            label: label.into(),
            edges: Vec::new(),
            proxy: None,
            failure: None,
        });
        handle
    }

    pub fn object(&mut self, label: impl Into<String>) -> HeapRef {
        self.alloc(BuiltinKind::Object, label)
    }

    pub fn function(&mut self, label: impl Into<String>) -> HeapRef {
        self.alloc(BuiltinKind::Function, label)
    }

    pub fn array(&mut self) -> HeapRef {
        self.alloc(BuiltinKind::Array, "Array")
    }

    pub fn symbol(&mut self, description: impl Into<String>) -> HeapRef {
        self.alloc(BuiltinKind::Symbol, description)
    }

    pub fn kind_of(&self, value: HeapRef) -> Option<BuiltinKind> {
        self.cells.get(value.index()).map(|cell| cell.kind)
    }

    fn cell_mut(&mut self, value: HeapRef) -> Result<&mut Cell, HeapError> {
        self.cells
            .get_mut(value.index())
            .ok_or(HeapError::UnknownRef(value))
    }

    fn check(&self, value: HeapRef) -> Result<(), HeapError> {
        self.kind_of(value).map(|_| ()).ok_or(HeapError::UnknownRef(value))
    }

    fn expect_kind(
        &self,
        value: HeapRef,
        allowed: &[BuiltinKind],
        operation: &'static str,
    ) -> Result<BuiltinKind, HeapError> {
        let kind = self.kind_of(value).ok_or(HeapError::UnknownRef(value))?;
        if allowed.contains(&kind) {
            Ok(kind)
        } else {
            Err(HeapError::WrongKind {
                value,
                kind,
                operation,
            })
        }
    }

    /// Record an arbitrary reference from `from`
    pub fn add_edge(&mut self, from: HeapRef, edge: RawEdge<HeapRef>) -> Result<(), HeapError> {
        self.check(edge.target)?;
        if let Some(key) = edge.kind.key() {
            self.check(*key)?;
        }
        self.cell_mut(from)?.edges.push(edge);
        Ok(())
    }

    fn structural(
        &mut self,
        from: HeapRef,
        kind: EdgeKind<HeapRef>,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.add_edge(from, RawEdge::structural(kind, to))
    }

    pub fn set_property(
        &mut self,
        from: HeapRef,
        name: impl Into<String>,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.structural(from, EdgeKind::Property { name: name.into() }, to)
    }

    /// Append to an array; returns the element's index
    pub fn push_element(&mut self, array: HeapRef, to: HeapRef) -> Result<u32, HeapError> {
        self.check(to)?;
        let cell = self.cell_mut(array)?;
        let count = cell
            .edges
            .iter()
            .filter(|edge| matches!(edge.kind, EdgeKind::Element { .. }))
            .count();
        let index = next_element_index(array, count)?;
        cell.edges
            .push(RawEdge::structural(EdgeKind::Element { index }, to));
        Ok(index)
    }

    pub fn set_symbol_property(
        &mut self,
        from: HeapRef,
        symbol: HeapRef,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.expect_kind(symbol, &[BuiltinKind::Symbol], "use as a symbol key")?;
        self.structural(from, EdgeKind::SymbolKey { key: symbol }, to)
    }

    pub fn set_private_field(
        &mut self,
        from: HeapRef,
        name: impl Into<String>,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.structural(from, EdgeKind::PrivateField { name: name.into() }, to)
    }

    pub fn set_internal_slot(
        &mut self,
        from: HeapRef,
        slot: impl Into<String>,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.structural(from, EdgeKind::InternalSlot { slot: slot.into() }, to)
    }

    /// A closure variable captured by `function`
    pub fn capture(
        &mut self,
        function: HeapRef,
        name: impl Into<String>,
        to: HeapRef,
    ) -> Result<(), HeapError> {
        self.expect_kind(function, &[BuiltinKind::Function], "closure capture")?;
        self.structural(function, EdgeKind::ClosureCapture { name: name.into() }, to)
    }

    pub fn set_prototype(&mut self, from: HeapRef, prototype: HeapRef) -> Result<(), HeapError> {
        self.structural(from, EdgeKind::Prototype, prototype)
    }

    pub fn set_constructor(
        &mut self,
        prototype: HeapRef,
        constructor: HeapRef,
    ) -> Result<(), HeapError> {
        self.structural(prototype, EdgeKind::ConstructorOf, constructor)
    }

    /// `map.set(key, value)` on a Map or WeakMap
    pub fn map_set(
        &mut self,
        map: HeapRef,
        key: HeapRef,
        value: HeapRef,
    ) -> Result<(), HeapError> {
        let kind = self.expect_kind(map, &[BuiltinKind::Map, BuiltinKind::WeakMap], "map entries")?;
        let hint = if kind.is_weak_collection() {
            StrengthHint::WeakKeyed
        } else {
            StrengthHint::Structural
        };
        self.add_edge(map, RawEdge::new(EdgeKind::CollectionKey, key, hint.clone()))?;
        self.add_edge(map, RawEdge::new(EdgeKind::CollectionValue { key }, value, hint))
    }

    /// `set.add(value)` on a Set or WeakSet
    pub fn set_add(&mut self, set: HeapRef, value: HeapRef) -> Result<(), HeapError> {
        let kind = self.expect_kind(set, &[BuiltinKind::Set, BuiltinKind::WeakSet], "set members")?;
        let hint = if kind.is_weak_collection() {
            StrengthHint::WeakOnly
        } else {
            StrengthHint::Structural
        };
        self.add_edge(set, RawEdge::new(EdgeKind::CollectionElement, value, hint))
    }

    /// Allocate a WeakRef pointing at `target`
    pub fn weak_ref(&mut self, target: HeapRef) -> Result<HeapRef, HeapError> {
        self.check(target)?;
        let weak = self.alloc(BuiltinKind::WeakRef, "WeakRef");
        self.point_weak_ref(weak, target)?;
        Ok(weak)
    }

    pub fn point_weak_ref(&mut self, weak: HeapRef, target: HeapRef) -> Result<(), HeapError> {
        self.expect_kind(weak, &[BuiltinKind::WeakRef], "weak targets")?;
        self.add_edge(
            weak,
            RawEdge::new(EdgeKind::WeakRefTarget, target, StrengthHint::WeakOnly),
        )
    }

    /// Allocate a FinalizationRegistry with its cleanup callback
    pub fn finalization_registry(&mut self, callback: HeapRef) -> Result<HeapRef, HeapError> {
        self.check(callback)?;
        let registry = self.alloc(BuiltinKind::FinalizationRegistry, "FinalizationRegistry");
        self.set_finalizer_callback(registry, callback)?;
        Ok(registry)
    }

    pub fn set_finalizer_callback(
        &mut self,
        registry: HeapRef,
        callback: HeapRef,
    ) -> Result<(), HeapError> {
        let registries = [BuiltinKind::FinalizationRegistry];
        self.expect_kind(registry, &registries, "finalizer callbacks")?;
        self.structural(registry, EdgeKind::FinalizerCallback, callback)
    }

    /// `registry.register(target, held, token)`
    ///
    /// The registry holds the held value strongly and the target and token
    /// weakly.
    pub fn register_finalizer(
        &mut self,
        registry: HeapRef,
        target: HeapRef,
        held: HeapRef,
        token: Option<HeapRef>,
    ) -> Result<(), HeapError> {
        self.expect_kind(registry, &[BuiltinKind::FinalizationRegistry], "finalizer registration")?;
        self.add_edge(
            registry,
            RawEdge::new(EdgeKind::FinalizerTarget, target, StrengthHint::WeakOnly),
        )?;
        self.structural(registry, EdgeKind::FinalizerHeldValue, held)?;
        if let Some(token) = token {
            self.add_edge(
                registry,
                RawEdge::new(EdgeKind::FinalizerUnregisterToken, token, StrengthHint::WeakOnly),
            )?;
        }
        Ok(())
    }

    /// Allocate a live proxy over `target`
    pub fn proxy(&mut self, target: HeapRef, handler: HeapRef) -> Result<HeapRef, HeapError> {
        self.check(target)?;
        self.check(handler)?;
        let proxy = self.alloc(BuiltinKind::Proxy, "Proxy");
        self.set_proxy_parts(proxy, target, handler)?;
        Ok(proxy)
    }

    pub fn set_proxy_parts(
        &mut self,
        proxy: HeapRef,
        target: HeapRef,
        handler: HeapRef,
    ) -> Result<(), HeapError> {
        self.expect_kind(proxy, &[BuiltinKind::Proxy], "proxy parts")?;
        self.check(target)?;
        self.check(handler)?;
        self.cell_mut(proxy)?.proxy = Some(ProxyParts { target, handler });
        Ok(())
    }

    /// Revoke a proxy; it no longer references its target or handler
    pub fn revoke(&mut self, proxy: HeapRef) -> Result<(), HeapError> {
        self.expect_kind(proxy, &[BuiltinKind::Proxy], "revocation")?;
        self.cell_mut(proxy)?.proxy = None;
        Ok(())
    }

    /// Make inspecting `value` fail, as a throwing getter would
    pub fn fail_on_inspect(
        &mut self,
        value: HeapRef,
        message: impl Into<String>,
    ) -> Result<(), HeapError> {
        self.cell_mut(value)?.failure = Some(message.into());
        Ok(())
    }
}

impl Introspector for ModelHeap {
    type Value = HeapRef;
    type Identity = HeapRef;

    fn identity_of(&self, value: &HeapRef) -> HeapRef {
        *value
    }

    fn category_of(&self, value: &HeapRef) -> ValueCategory {
        match self.kind_of(*value) {
            Some(BuiltinKind::Symbol) => ValueCategory::Symbol,
            _ => ValueCategory::Reference,
        }
    }

    fn describe(&self, value: &HeapRef) -> NodeDescription {
        match self.cells.get(value.index()) {
            Some(cell) => NodeDescription::new(cell.kind, cell.label.clone()),
            None => NodeDescription::new(BuiltinKind::Object, value.to_string()),
        }
    }

    fn edges_of(&self, value: &HeapRef) -> Result<Vec<RawEdge<HeapRef>>, IntrospectionError> {
        let cell = self
            .cells
            .get(value.index())
            .ok_or_else(|| IntrospectionError::Stale(value.to_string()))?;
        if let Some(message) = &cell.failure {
            return Err(IntrospectionError::Evaluation {
                value: value.to_string(),
                message: message.clone(),
            });
        }
        Ok(cell.edges.clone())
    }

    fn proxy_parts(&self, value: &HeapRef) -> Option<ProxyParts<HeapRef>> {
        self.cells.get(value.index()).and_then(|cell| cell.proxy.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_are_numbered_in_push_order() {
        let mut heap = ModelHeap::new();
        let array = heap.array();
        let a = heap.object("A");
        let b = heap.object("B");
        assert_eq!(heap.push_element(array, a).unwrap(), 0);
        assert_eq!(heap.push_element(array, b).unwrap(), 1);
        heap.set_property(array, "length", a).unwrap();
        let c = heap.object("C");
        assert_eq!(heap.push_element(array, c).unwrap(), 2);
    }

    #[test]
    fn weak_map_entries_are_weak_keyed() {
        let mut heap = ModelHeap::new();
        let map = heap.alloc(BuiltinKind::WeakMap, "WeakMap");
        let key = heap.object("Key");
        let value = heap.object("Value");
        heap.map_set(map, key, value).unwrap();

        let edges = heap.edges_of(&map).unwrap();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.hint == StrengthHint::WeakKeyed));
        assert_eq!(edges[1].kind, EdgeKind::CollectionValue { key });
    }

    #[test]
    fn strong_map_entries_are_structural() {
        let mut heap = ModelHeap::new();
        let map = heap.alloc(BuiltinKind::Map, "Map");
        let key = heap.object("Key");
        let value = heap.object("Value");
        heap.map_set(map, key, value).unwrap();
        assert!(heap
            .edges_of(&map)
            .unwrap()
            .iter()
            .all(|e| e.hint == StrengthHint::Structural));
    }

    #[test]
    fn operations_check_container_kind() {
        let mut heap = ModelHeap::new();
        let plain = heap.object("Plain");
        let other = heap.object("Other");
        let err = heap.map_set(plain, other, other).unwrap_err();
        assert!(matches!(err, HeapError::WrongKind { operation: "map entries", .. }));
        assert!(heap.revoke(plain).is_err());
        assert!(heap.capture(plain, "x", other).is_err());
    }

    #[test]
    fn element_count_past_u32_is_an_error() {
        let array = HeapRef(0);
        assert_eq!(next_element_index(array, u32::MAX as usize), Ok(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            next_element_index(array, u32::MAX as usize + 1),
            Err(HeapError::TooManyElements(array))
        );
    }

    #[test]
    fn strong_set_members_are_structural() {
        let mut heap = ModelHeap::new();
        let set = heap.alloc(BuiltinKind::Set, "Set");
        let member = heap.object("Member");
        heap.set_add(set, member).unwrap();
        assert_eq!(heap.edges_of(&set).unwrap()[0].hint, StrengthHint::Structural);
    }

    #[test]
    fn unknown_refs_are_rejected() {
        let mut heap = ModelHeap::new();
        let a = heap.object("A");
        let ghost = HeapRef(99);
        assert_eq!(heap.set_property(a, "x", ghost), Err(HeapError::UnknownRef(ghost)));
        assert!(matches!(heap.edges_of(&ghost), Err(IntrospectionError::Stale(_))));
    }

    #[test]
    fn finalizer_registration_holds_only_held_value_strongly() {
        let mut heap = ModelHeap::new();
        let callback = heap.function("cleanup");
        let registry = heap.finalization_registry(callback).unwrap();
        let target = heap.object("Target");
        let held = heap.object("Held");
        let token = heap.object("Token");
        heap.register_finalizer(registry, target, held, Some(token)).unwrap();

        let structural: Vec<HeapRef> = heap
            .edges_of(&registry)
            .unwrap()
            .into_iter()
            .filter(|e| e.hint == StrengthHint::Structural)
            .map(|e| e.target)
            .collect();
        assert_eq!(structural, vec![callback, held]);
    }

    #[test]
    fn symbols_draw_from_symbol_namespace() {
        let mut heap = ModelHeap::new();
        let sym = heap.symbol("Symbol(tag)");
        let obj = heap.object("Obj");
        assert_eq!(heap.category_of(&sym), ValueCategory::Symbol);
        assert_eq!(heap.category_of(&obj), ValueCategory::Reference);
    }
}
