//! Trigger conditions and the fixed-size [`TriggerSet`] bitset.
//!
//! A region owns an ordered list of [`Trigger`]s. Evaluating the list against
//! the signal store yields a [`TriggerSet`] with bit `i` set when trigger `i`
//! is active. The bitset exposes the set algebra the scheduler needs
//! (`any`, `and_not`, `or_in_place`, `clear`) without leaking its word layout.

use std::fmt;

use crate::value::{SignalId, SignalStore};

const WORD_BITS: usize = 64;

/// Index of a trigger within its region's trigger list.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TriggerId(u32);

impl TriggerId {
    /// Creates a `TriggerId` from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A fixed-size set of trigger bits.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct TriggerSet {
    words: Vec<u64>,
    len: usize,
}

impl TriggerSet {
    /// Creates an empty set able to hold `len` triggers.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Number of trigger slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if any trigger is active.
    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    /// Returns the state of trigger `index`.
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "trigger {index} out of range");
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Sets or clears trigger `index`.
    pub fn set(&mut self, index: usize, active: bool) {
        debug_assert!(index < self.len, "trigger {index} out of range");
        let bit = 1u64 << (index % WORD_BITS);
        if active {
            self.words[index / WORD_BITS] |= bit;
        } else {
            self.words[index / WORD_BITS] &= !bit;
        }
    }

    /// Returns `self AND NOT other`.
    pub fn and_not(&self, other: &TriggerSet) -> TriggerSet {
        debug_assert_eq!(self.len, other.len);
        TriggerSet {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & !b)
                .collect(),
            len: self.len,
        }
    }

    /// Sets `self |= other`.
    pub fn or_in_place(&mut self, other: &TriggerSet) {
        debug_assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Returns `true` if `self` and `other` share an active trigger.
    pub fn intersects(&self, other: &TriggerSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Deactivates every trigger.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Iterates over the indices of active triggers in ascending order.
    pub fn iter_active(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }

    /// Number of active triggers.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl fmt::Debug for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_active()).finish()
    }
}

/// The condition a trigger tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerKind {
    /// LSB went from 0 to 1.
    Posedge(SignalId),
    /// LSB went from 1 to 0.
    Negedge(SignalId),
    /// LSB changed in either direction.
    AnyEdge(SignalId),
    /// Any bit of the value changed.
    Changed(SignalId),
    /// Fires on the first pass of the region in each step.
    FirstIteration,
}

impl TriggerKind {
    /// The signal this trigger samples, if any.
    pub fn signal(&self) -> Option<SignalId> {
        match *self {
            TriggerKind::Posedge(s)
            | TriggerKind::Negedge(s)
            | TriggerKind::AnyEdge(s)
            | TriggerKind::Changed(s) => Some(s),
            TriggerKind::FirstIteration => None,
        }
    }
}

/// A trigger with a description used when dumping active triggers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trigger {
    /// The condition.
    pub kind: TriggerKind,
    /// Human-readable description, e.g. `@(posedge axi4_lite_slave.ACLK)`.
    pub description: String,
}

/// Evaluates a region's ordered trigger list against the signal store.
#[derive(Clone, Debug, Default)]
pub struct TriggerEvaluator {
    triggers: Vec<Trigger>,
    tracked: Vec<SignalId>,
}

impl TriggerEvaluator {
    /// Creates an evaluator over a fixed trigger list.
    pub fn new(triggers: Vec<Trigger>) -> Self {
        let mut tracked: Vec<SignalId> = triggers.iter().filter_map(|t| t.kind.signal()).collect();
        tracked.sort_unstable();
        tracked.dedup();
        Self { triggers, tracked }
    }

    /// An evaluator holding only the synthetic first-iteration trigger.
    pub fn first_iteration_only(region_label: &str) -> Self {
        Self::new(vec![Trigger {
            kind: TriggerKind::FirstIteration,
            description: format!("Internal '{region_label}' trigger - first iteration"),
        }])
    }

    /// Number of triggers in the list.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// The trigger list, in evaluation order.
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Signals whose previous-value shadows this evaluator depends on.
    pub fn tracked_signals(&self) -> &[SignalId] {
        &self.tracked
    }

    /// Computes which triggers are active.
    ///
    /// Pure function of the store's current and previous values plus the
    /// `first_iteration` flag supplied by the region driver.
    pub fn evaluate(&self, store: &SignalStore, first_iteration: bool) -> TriggerSet {
        let mut set = TriggerSet::new(self.triggers.len());
        for (i, trigger) in self.triggers.iter().enumerate() {
            set.set(i, is_active(trigger.kind, store, first_iteration));
        }
        set
    }

    /// Descriptions of the active triggers in `set`.
    pub fn describe(&self, set: &TriggerSet) -> Vec<&str> {
        set.iter_active()
            .map(|i| self.triggers[i].description.as_str())
            .collect()
    }
}

fn is_active(kind: TriggerKind, store: &SignalStore, first_iteration: bool) -> bool {
    let sample = |s: SignalId| (store.previous(s), store.read(s));
    match kind {
        TriggerKind::Posedge(s) => {
            let (prev, curr) = sample(s);
            prev & 1 == 0 && curr & 1 == 1
        }
        TriggerKind::Negedge(s) => {
            let (prev, curr) = sample(s);
            prev & 1 == 1 && curr & 1 == 0
        }
        TriggerKind::AnyEdge(s) => {
            let (prev, curr) = sample(s);
            (prev ^ curr) & 1 == 1
        }
        TriggerKind::Changed(s) => {
            let (prev, curr) = sample(s);
            prev != curr
        }
        TriggerKind::FirstIteration => first_iteration,
    }
}
