//! Signal and memory storage with width validation.
//!
//! Every scalar signal has a flat [`SignalId`], a declared bit width, a
//! current value, and a previous-value shadow used by the trigger evaluator
//! for edge detection. Register arrays are addressed by [`MemoryId`] plus a
//! word index. All values are two-state and stored in a `u64`.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// The widest signal the store accepts.
pub const MAX_WIDTH: u32 = 64;

/// Returns the all-ones mask for a value of `width` bits.
pub fn width_mask(width: u32) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Returns `true` if `value` is representable in `width` bits.
pub fn fits_width(value: u64, width: u32) -> bool {
    value & !width_mask(width) == 0
}

/// Opaque ID for a scalar signal in a [`SignalStore`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SignalId(u32);

impl SignalId {
    /// Creates a `SignalId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Opaque ID for a register array in a [`SignalStore`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct MemoryId(u32);

impl MemoryId {
    /// Creates a `MemoryId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Runtime state of a scalar signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalState {
    /// Hierarchical name, e.g. `axi4_lite_slave.read_state`.
    pub name: String,
    /// Declared bit width (1..=64).
    pub width: u32,
    /// Current value.
    pub value: u64,
    /// Value sampled at the last shadow refresh (for edge detection).
    pub previous_value: u64,
}

impl SignalState {
    /// Creates a signal whose shadow starts equal to its initial value.
    pub fn new(name: String, width: u32, init: u64) -> Self {
        Self {
            name,
            width,
            value: init,
            previous_value: init,
        }
    }
}

/// Runtime state of a register array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryState {
    /// Hierarchical name, e.g. `axi4_lite_slave.memory`.
    pub name: String,
    /// Width of each word in bits.
    pub width: u32,
    /// Word storage; its length is the memory depth.
    pub words: Vec<u64>,
}

impl MemoryState {
    /// Number of addressable words.
    pub fn depth(&self) -> u32 {
        self.words.len() as u32
    }
}

/// Owner of every signal and memory value in a simulation instance.
///
/// IDs are handed out by the design builder and stay valid for the lifetime
/// of the store. Accessors panic on an ID that did not come from this store,
/// the same contract as an arena lookup.
#[derive(Clone, Debug, Default)]
pub struct SignalStore {
    signals: Vec<SignalState>,
    memories: Vec<MemoryState>,
}

impl SignalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a scalar signal.
    pub(crate) fn alloc_signal(
        &mut self,
        name: String,
        width: u32,
        init: u64,
    ) -> Result<SignalId, SimError> {
        check_declared_width(&name, width)?;
        if !fits_width(init, width) {
            return Err(SimError::WidthViolation { name, width, value: init });
        }
        let id = SignalId::from_raw(self.signals.len() as u32);
        self.signals.push(SignalState::new(name, width, init));
        Ok(id)
    }

    /// Allocates a zero-initialized register array of `depth` words.
    pub(crate) fn alloc_memory(
        &mut self,
        name: String,
        width: u32,
        depth: u32,
    ) -> Result<MemoryId, SimError> {
        check_declared_width(&name, width)?;
        if depth == 0 {
            return Err(SimError::design(format!("memory '{name}' has zero depth")));
        }
        let id = MemoryId::from_raw(self.memories.len() as u32);
        self.memories.push(MemoryState {
            name,
            width,
            words: vec![0; depth as usize],
        });
        Ok(id)
    }

    /// Returns the current value of a signal.
    pub fn read(&self, id: SignalId) -> u64 {
        self.signal(id).value
    }

    /// Returns the previous-value shadow of a signal.
    pub fn previous(&self, id: SignalId) -> u64 {
        self.signal(id).previous_value
    }

    /// Writes a signal, rejecting values wider than its declared width.
    pub fn write(&mut self, id: SignalId, value: u64) -> Result<(), SimError> {
        self.check_signal(id, value)?;
        self.signals[id.as_raw() as usize].value = value;
        Ok(())
    }

    /// Validates a prospective signal write without performing it.
    pub fn check_signal(&self, id: SignalId, value: u64) -> Result<(), SimError> {
        let sig = self.signal(id);
        if fits_width(value, sig.width) {
            Ok(())
        } else {
            Err(SimError::WidthViolation {
                name: sig.name.clone(),
                width: sig.width,
                value,
            })
        }
    }

    /// Reads one word of a memory.
    pub fn read_word(&self, mem: MemoryId, index: u32) -> Result<u64, SimError> {
        let m = self.memory(mem);
        m.words
            .get(index as usize)
            .copied()
            .ok_or_else(|| SimError::IndexOutOfRange {
                name: m.name.clone(),
                index,
                depth: m.depth(),
            })
    }

    /// Writes one word of a memory.
    pub fn write_word(&mut self, mem: MemoryId, index: u32, value: u64) -> Result<(), SimError> {
        self.check_word(mem, index, value)?;
        self.memories[mem.as_raw() as usize].words[index as usize] = value;
        Ok(())
    }

    /// Validates a prospective memory write without performing it.
    pub fn check_word(&self, mem: MemoryId, index: u32, value: u64) -> Result<(), SimError> {
        let m = self.memory(mem);
        if index >= m.depth() {
            return Err(SimError::IndexOutOfRange {
                name: m.name.clone(),
                index,
                depth: m.depth(),
            });
        }
        if !fits_width(value, m.width) {
            return Err(SimError::WidthViolation {
                name: m.name.clone(),
                width: m.width,
                value,
            });
        }
        Ok(())
    }

    /// Copies current → previous for the given signals.
    pub fn snapshot_previous(&mut self, ids: &[SignalId]) {
        for &id in ids {
            let sig = &mut self.signals[id.as_raw() as usize];
            sig.previous_value = sig.value;
        }
    }

    /// Returns the full state of a signal.
    pub fn signal(&self, id: SignalId) -> &SignalState {
        &self.signals[id.as_raw() as usize]
    }

    /// Returns the full state of a memory.
    pub fn memory(&self, id: MemoryId) -> &MemoryState {
        &self.memories[id.as_raw() as usize]
    }

    /// Returns the number of scalar signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the number of memories.
    pub fn memory_count(&self) -> usize {
        self.memories.len()
    }
}

fn check_declared_width(name: &str, width: u32) -> Result<(), SimError> {
    if width == 0 || width > MAX_WIDTH {
        return Err(SimError::design(format!(
            "'{name}' declares width {width}; supported widths are 1..={MAX_WIDTH}"
        )));
    }
    Ok(())
}
