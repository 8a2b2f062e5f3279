//! Delayed-write buffer for non-blocking assignments.
//!
//! Sequential blocks stage writes here while they execute; nothing becomes
//! visible until the NBA region calls [`DelayedWriteBuffer::commit`], which
//! applies every pending write as one batch. Slots are kept across steps
//! and carry an explicit `set` flag, so a slot that was not written this
//! step is distinguishable from one that was written with zero.

use std::collections::HashMap;

use crate::error::SimError;
use crate::value::{MemoryId, SignalId, SignalStore};

/// Destination of a delayed write.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WriteTarget {
    /// A scalar signal.
    Signal(SignalId),
    /// One word of a register array.
    Word {
        /// The memory.
        mem: MemoryId,
        /// Word index.
        index: u32,
    },
}

/// One staged non-blocking assignment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DelayedWrite {
    /// Where the value goes.
    pub target: WriteTarget,
    /// The value to commit.
    pub value: u64,
    /// Whether this slot holds a write for the current step.
    pub set: bool,
}

/// Pending non-blocking assignments for the current step.
#[derive(Clone, Debug, Default)]
pub struct DelayedWriteBuffer {
    slots: Vec<DelayedWrite>,
    slot_of: HashMap<WriteTarget, usize>,
    pending: usize,
}

impl DelayedWriteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a write, replacing any earlier write to the same target.
    ///
    /// The value is validated against the store now so that [`commit`]
    /// cannot fail part-way through a batch.
    ///
    /// [`commit`]: DelayedWriteBuffer::commit
    pub fn stage(
        &mut self,
        store: &SignalStore,
        target: WriteTarget,
        value: u64,
    ) -> Result<(), SimError> {
        match target {
            WriteTarget::Signal(id) => store.check_signal(id, value)?,
            WriteTarget::Word { mem, index } => store.check_word(mem, index, value)?,
        }
        let index = match self.slot_of.get(&target) {
            Some(&i) => i,
            None => {
                let i = self.slots.len();
                self.slots.push(DelayedWrite {
                    target,
                    value: 0,
                    set: false,
                });
                self.slot_of.insert(target, i);
                i
            }
        };
        let slot = &mut self.slots[index];
        if !slot.set {
            self.pending += 1;
        }
        slot.value = value;
        slot.set = true;
        Ok(())
    }

    /// The value currently staged for `target`, if any.
    pub fn staged(&self, target: WriteTarget) -> Option<u64> {
        self.slot_of
            .get(&target)
            .map(|&i| &self.slots[i])
            .filter(|s| s.set)
            .map(|s| s.value)
    }

    /// Number of writes waiting for commit.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Returns `true` if nothing is waiting for commit.
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Applies every pending write to `store` and clears the set flags.
    ///
    /// All writes are validated before any is applied, so either the whole
    /// batch lands or none of it does. Returns the number of writes applied.
    pub fn commit(&mut self, store: &mut SignalStore) -> Result<usize, SimError> {
        for slot in self.slots.iter().filter(|s| s.set) {
            match slot.target {
                WriteTarget::Signal(id) => store.check_signal(id, slot.value)?,
                WriteTarget::Word { mem, index } => store.check_word(mem, index, slot.value)?,
            }
        }
        let mut applied = 0;
        for slot in self.slots.iter_mut().filter(|s| s.set) {
            match slot.target {
                WriteTarget::Signal(id) => store.write(id, slot.value)?,
                WriteTarget::Word { mem, index } => store.write_word(mem, index, slot.value)?,
            }
            slot.set = false;
            applied += 1;
        }
        self.pending = 0;
        Ok(applied)
    }

    /// Drops every pending write without applying it.
    pub fn discard(&mut self) {
        for slot in &mut self.slots {
            slot.set = false;
        }
        self.pending = 0;
    }
}
