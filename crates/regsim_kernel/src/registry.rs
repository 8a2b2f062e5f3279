//! Name-based introspection of a design's variables.
//!
//! The [`Registry`] maps stable hierarchical names (`TOP.ARADDR`,
//! `axi4_lite_slave.read_state`) to a [`VarEntry`] holding the storage
//! handle plus the metadata a harness needs: bit range, direction,
//! visibility and access. It is built once with the design and never
//! changes afterwards. [`Snapshot`] is a serializable copy of every
//! registered value at one point in time.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SimError;
use crate::value::{MemoryId, SignalId, SignalStore};

/// Scope name of the top-level port mirrors.
pub const TOP_SCOPE: &str = "TOP";

/// Where a registered variable's value lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    /// A scalar signal in the store.
    Signal(SignalId),
    /// A register array in the store.
    Memory(MemoryId),
    /// A compile-time constant such as a `localparam`.
    Const(u64),
}

/// Port direction as seen from outside the design.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Driven by the harness.
    Input,
    /// Driven by the design.
    Output,
    /// Not a port.
    Internal,
}

/// Whether a variable is a top-level port or a module-internal variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Registered in the `TOP` scope.
    Public,
    /// Registered in the module scope.
    Internal,
}

/// Whether the harness may write a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    /// Readable and writable.
    ReadWrite,
    /// Readable only.
    ReadOnly,
}

/// One registered variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarEntry {
    /// Full name, `<scope>.<local>`.
    pub name: String,
    /// Scope the variable is registered in.
    pub scope: String,
    /// Storage handle.
    pub handle: Handle,
    /// Width in bits.
    pub width: u32,
    /// Most significant bit index.
    pub msb: u32,
    /// Least significant bit index.
    pub lsb: u32,
    /// Number of words for memories.
    pub depth: Option<u32>,
    /// Port direction.
    pub direction: Direction,
    /// Port or internal variable.
    pub visibility: Visibility,
    /// Harness write permission.
    pub access: Access,
}

impl VarEntry {
    /// Renders the packed range, e.g. `[31:0]`, or an empty string for a single bit.
    pub fn range(&self) -> String {
        if self.width == 1 {
            String::new()
        } else {
            format!("[{}:{}]", self.msb, self.lsb)
        }
    }
}

/// Immutable name → variable table.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, VarEntry>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: VarEntry) -> Result<(), SimError> {
        if self.entries.contains_key(&entry.name) {
            return Err(SimError::design(format!(
                "'{}' is registered twice",
                entry.name
            )));
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up a variable by full name.
    pub fn get(&self, name: &str) -> Result<&VarEntry, SimError> {
        self.entries.get(name).ok_or_else(|| SimError::UnknownSignal {
            name: name.to_string(),
        })
    }

    /// Iterates over every entry in name order.
    pub fn iter(&self) -> impl Iterator<Item = &VarEntry> {
        self.entries.values()
    }

    /// Iterates over the entries registered in `scope`.
    pub fn scope<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a VarEntry> + 'a {
        self.entries.values().filter(move |e| e.scope == scope)
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captures the current value of every registered variable.
    pub fn snapshot(&self, store: &SignalStore) -> Snapshot {
        let entries = self
            .entries
            .values()
            .map(|e| SnapshotEntry {
                name: e.name.clone(),
                width: e.width,
                msb: e.msb,
                lsb: e.lsb,
                direction: e.direction,
                visibility: e.visibility,
                value: match e.handle {
                    Handle::Signal(id) => SnapshotValue::Scalar(store.read(id)),
                    Handle::Const(v) => SnapshotValue::Scalar(v),
                    Handle::Memory(id) => SnapshotValue::Array(store.memory(id).words.clone()),
                },
            })
            .collect();
        Snapshot { entries }
    }
}

/// Value of one variable inside a [`Snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    /// Scalar or constant value.
    Scalar(u64),
    /// Every word of a memory.
    Array(Vec<u64>),
}

/// One variable inside a [`Snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    /// Full name.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Most significant bit index.
    pub msb: u32,
    /// Least significant bit index.
    pub lsb: u32,
    /// Port direction.
    pub direction: Direction,
    /// Port or internal variable.
    pub visibility: Visibility,
    /// Captured value.
    pub value: SnapshotValue,
}

/// Point-in-time copy of every registered variable, ordered by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// The captured entries.
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Finds an entry by full name.
    pub fn get(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Returns the scalar value of `name`, if it exists and is not a memory.
    pub fn scalar(&self, name: &str) -> Option<u64> {
        match self.get(name)?.value {
            SnapshotValue::Scalar(v) => Some(v),
            SnapshotValue::Array(_) => None,
        }
    }
}
