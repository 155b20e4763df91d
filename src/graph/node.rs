//! Node representation in the reference graph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a value discovered during one search
///
/// Serializes as a plain namespaced string: `object:N`, `symbol:N`, or one of
/// the reserved ids `heldValues` and `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ValueId {
    /// The synthetic container holding the search roots
    HeldValues,
    /// The value whose reachability is under test
    Target,
    /// An ordinary reference value (object, function, collection, ...)
    Object(u32),
    /// A symbol-like key value
    Symbol(u32),
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueId::HeldValues => write!(f, "heldValues"),
            ValueId::Target => write!(f, "target"),
            ValueId::Object(n) => write!(f, "object:{}", n),
            ValueId::Symbol(n) => write!(f, "symbol:{}", n),
        }
    }
}

/// Error returned when a string is not a valid [`ValueId`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value id: {0}")]
pub struct ParseValueIdError(String);

impl FromStr for ValueId {
    type Err = ParseValueIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heldValues" => return Ok(ValueId::HeldValues),
            "target" => return Ok(ValueId::Target),
            _ => {}
        }
        let (namespace, counter) = s
            .split_once(':')
            .ok_or_else(|| ParseValueIdError(s.to_string()))?;
        let counter: u32 = counter
            .parse()
            .map_err(|_| ParseValueIdError(s.to_string()))?;
        match namespace {
            "object" => Ok(ValueId::Object(counter)),
            "symbol" => Ok(ValueId::Symbol(counter)),
            _ => Err(ParseValueIdError(s.to_string())),
        }
    }
}

impl From<ValueId> for String {
    fn from(id: ValueId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ValueId {
    type Error = ParseValueIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Closed classification of the runtime's built-in value shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuiltinKind {
    Object,
    Function,
    Array,
    Map,
    Set,
    WeakMap,
    WeakSet,
    WeakRef,
    FinalizationRegistry,
    /// Forwarding wrapper with a target and a handler
    Proxy,
    Iterator,
    Promise,
    Symbol,
}

impl BuiltinKind {
    /// Collections that hold their keys or elements without retaining them
    pub fn is_weak_collection(&self) -> bool {
        matches!(self, BuiltinKind::WeakMap | BuiltinKind::WeakSet)
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuiltinKind::Object => "Object",
            BuiltinKind::Function => "Function",
            BuiltinKind::Array => "Array",
            BuiltinKind::Map => "Map",
            BuiltinKind::Set => "Set",
            BuiltinKind::WeakMap => "WeakMap",
            BuiltinKind::WeakSet => "WeakSet",
            BuiltinKind::WeakRef => "WeakRef",
            BuiltinKind::FinalizationRegistry => "FinalizationRegistry",
            BuiltinKind::Proxy => "Proxy",
            BuiltinKind::Iterator => "Iterator",
            BuiltinKind::Promise => "Promise",
            BuiltinKind::Symbol => "Symbol",
        };
        f.write_str(name)
    }
}

/// A node in the reference graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Search-scoped identity
    pub id: ValueId,
    /// Built-in shape of the value
    pub builtin_kind: BuiltinKind,
    /// Best-effort human label (constructor name, function name, ...)
    pub derived_label: String,
}

impl GraphNode {
    /// Create a new node
    pub fn new(id: ValueId, builtin_kind: BuiltinKind, derived_label: impl Into<String>) -> Self {
        Self {
            id,
            builtin_kind,
            derived_label: derived_label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_id_display_is_namespaced() {
        assert_eq!(ValueId::Object(12).to_string(), "object:12");
        assert_eq!(ValueId::Symbol(3).to_string(), "symbol:3");
        assert_eq!(ValueId::Target.to_string(), "target");
        assert_eq!(ValueId::HeldValues.to_string(), "heldValues");
    }

    #[test]
    fn value_id_parses_its_own_display() {
        for id in [
            ValueId::Object(0),
            ValueId::Symbol(41),
            ValueId::Target,
            ValueId::HeldValues,
        ] {
            assert_eq!(id.to_string().parse::<ValueId>(), Ok(id));
        }
    }

    #[test]
    fn value_id_rejects_unknown_namespace() {
        assert!("reference:87".parse::<ValueId>().is_err());
        assert!("object:".parse::<ValueId>().is_err());
        assert!("object".parse::<ValueId>().is_err());
    }

    #[test]
    fn reserved_ids_sort_first() {
        let mut ids = vec![
            ValueId::Symbol(0),
            ValueId::Object(2),
            ValueId::Target,
            ValueId::HeldValues,
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ValueId::HeldValues,
                ValueId::Target,
                ValueId::Object(2),
                ValueId::Symbol(0)
            ]
        );
    }
}
