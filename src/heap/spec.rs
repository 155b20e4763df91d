//! Declarative heap descriptions
//!
//! A heap document names its values, lists the operations that connect them,
//! and picks the search target and held roots:
//!
//! ```yaml
//! values:
//!   - { name: cache, kind: weakMap }
//!   - { name: session }
//!   - { name: token }
//! references:
//!   - { op: mapSet, map: cache, key: session, value: token }
//! target: token
//! held: [cache, session]
//! ```

use super::model::{HeapError, HeapRef, ModelHeap};
use crate::graph::BuiltinKind;
use crate::search::{load_document, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HeapSpecError {
    #[error("value '{0}' is declared more than once")]
    DuplicateValue(String),

    #[error("value '{0}' is not declared")]
    UnknownValue(String),

    #[error(transparent)]
    Heap(#[from] HeapError),

    #[error(transparent)]
    Load(#[from] ConfigError),
}

fn default_kind() -> BuiltinKind {
    BuiltinKind::Object
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueSpec {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: BuiltinKind,
    /// Defaults to the value's name
    #[serde(default)]
    pub label: Option<String>,
    /// Inspecting this value fails with the given message
    #[serde(default)]
    pub fails: Option<String>,
}

/// One reference-creating operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReferenceSpec {
    Property { from: String, name: String, to: String },
    Element { from: String, to: String },
    SymbolProperty { from: String, symbol: String, to: String },
    PrivateField { from: String, name: String, to: String },
    InternalSlot { from: String, slot: String, to: String },
    Capture { from: String, name: String, to: String },
    Prototype { from: String, to: String },
    Constructor { from: String, to: String },
    MapSet { map: String, key: String, value: String },
    SetAdd { set: String, value: String },
    WeakRef { from: String, to: String },
    FinalizerCallback { registry: String, callback: String },
    Register {
        registry: String,
        target: String,
        held: String,
        #[serde(default)]
        token: Option<String>,
    },
    Proxy { proxy: String, target: String, handler: String },
    Revoke { proxy: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeapSpec {
    pub values: Vec<ValueSpec>,
    #[serde(default)]
    pub references: Vec<ReferenceSpec>,
    pub target: String,
    #[serde(default)]
    pub held: Vec<String>,
}

/// A heap built from a [`HeapSpec`], with its search inputs resolved
#[derive(Debug, Clone)]
pub struct LoadedHeap {
    pub heap: ModelHeap,
    pub target: HeapRef,
    pub held: Vec<HeapRef>,
    names: HashMap<String, HeapRef>,
}

impl LoadedHeap {
    /// Handle of a declared value
    pub fn get(&self, name: &str) -> Option<HeapRef> {
        self.names.get(name).copied()
    }
}

impl HeapSpec {
    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: &Path) -> Result<Self, HeapSpecError> {
        Ok(load_document(path)?)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Allocate every value and apply the operations in order
    pub fn build(&self) -> Result<LoadedHeap, HeapSpecError> {
        let mut heap = ModelHeap::new();
        let mut names: HashMap<String, HeapRef> = HashMap::new();

        for value in &self.values {
            if names.contains_key(&value.name) {
                return Err(HeapSpecError::DuplicateValue(value.name.clone()));
            }
            let label = value.label.clone().unwrap_or_else(|| value.name.clone());
            let handle = heap.alloc(value.kind, label);
            if let Some(message) = &value.fails {
                heap.fail_on_inspect(handle, message.clone())?;
            }
            names.insert(value.name.clone(), handle);
        }

        let lookup = |name: &str| {
            names
                .get(name)
                .copied()
                .ok_or_else(|| HeapSpecError::UnknownValue(name.to_string()))
        };

        for reference in &self.references {
            match reference {
                ReferenceSpec::Property { from, name, to } => {
                    heap.set_property(lookup(from)?, name.clone(), lookup(to)?)?
                }
                ReferenceSpec::Element { from, to } => {
                    heap.push_element(lookup(from)?, lookup(to)?)?;
                }
                ReferenceSpec::SymbolProperty { from, symbol, to } => {
                    heap.set_symbol_property(lookup(from)?, lookup(symbol)?, lookup(to)?)?
                }
                ReferenceSpec::PrivateField { from, name, to } => {
                    heap.set_private_field(lookup(from)?, name.clone(), lookup(to)?)?
                }
                ReferenceSpec::InternalSlot { from, slot, to } => {
                    heap.set_internal_slot(lookup(from)?, slot.clone(), lookup(to)?)?
                }
                ReferenceSpec::Capture { from, name, to } => {
                    heap.capture(lookup(from)?, name.clone(), lookup(to)?)?
                }
                ReferenceSpec::Prototype { from, to } => {
                    heap.set_prototype(lookup(from)?, lookup(to)?)?
                }
                ReferenceSpec::Constructor { from, to } => {
                    heap.set_constructor(lookup(from)?, lookup(to)?)?
                }
                ReferenceSpec::MapSet { map, key, value } => {
                    heap.map_set(lookup(map)?, lookup(key)?, lookup(value)?)?
                }
                ReferenceSpec::SetAdd { set, value } => heap.set_add(lookup(set)?, lookup(value)?)?,
                ReferenceSpec::WeakRef { from, to } => {
                    heap.point_weak_ref(lookup(from)?, lookup(to)?)?
                }
                ReferenceSpec::FinalizerCallback { registry, callback } => {
                    heap.set_finalizer_callback(lookup(registry)?, lookup(callback)?)?
                }
                ReferenceSpec::Register {
                    registry,
                    target,
                    held,
                    token,
                } => {
                    let token = token.as_deref().map(lookup).transpose()?;
                    let (registry, target) = (lookup(registry)?, lookup(target)?);
                    heap.register_finalizer(registry, target, lookup(held)?, token)?
                }
                ReferenceSpec::Proxy {
                    proxy,
                    target,
                    handler,
                } => heap.set_proxy_parts(lookup(proxy)?, lookup(target)?, lookup(handler)?)?,
                ReferenceSpec::Revoke { proxy } => heap.revoke(lookup(proxy)?)?,
            }
        }

        let target = lookup(&self.target)?;
        let held = self
            .held
            .iter()
            .map(|name| lookup(name))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            values = self.values.len(),
            references = self.references.len(),
            "built heap from description"
        );

        Ok(LoadedHeap {
            heap,
            target,
            held,
            names,
        })
    }
}
