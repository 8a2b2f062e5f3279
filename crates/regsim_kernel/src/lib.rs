//! Region-scheduled evaluation kernel for small synchronous designs.
//!
//! A design is a set of signals, register arrays and logic blocks built with
//! [`DesignBuilder`]. [`SimKernel`] evaluates it one step at a time, running
//! the input-combinational (ICO), active (ACT) and non-blocking-assignment
//! (NBA) regions until each reaches a fixed point. Sequential blocks stage
//! register updates in a delayed-write buffer that is committed as a batch,
//! so every block triggered by the same edge observes pre-edge state.
//!
//! # Modules
//!
//! - `error`: Kernel error types
//! - `value`: Width-checked signal and memory storage
//! - `trigger`: Edge and change triggers, trigger bitsets
//! - `nba`: Delayed-write buffer
//! - `region`: Region identifiers and the bounded fixed-point driver
//! - `registry`: Name-based introspection and snapshots
//! - `design`: Design descriptions and the builder
//! - `kernel`: The step loop
//! - `harness`: Clocked poke/peek/tick driver
//! - `interactive`: Line-oriented REPL

#![warn(missing_docs)]

pub mod design;
pub mod error;
pub mod harness;
pub mod interactive;
pub mod kernel;
pub mod nba;
pub mod region;
pub mod registry;
pub mod trigger;
pub mod value;

pub use design::{BlockContext, BlockKind, Design, DesignBuilder, Port};
pub use error::SimError;
pub use harness::Harness;
pub use interactive::InteractiveSim;
pub use kernel::{KernelConfig, SimKernel, SimStats, StepReport};
pub use region::{Region, DEFAULT_MAX_ITERATIONS};
pub use registry::{Access, Direction, Registry, Snapshot, VarEntry, Visibility};
pub use trigger::{TriggerId, TriggerKind, TriggerSet};
pub use value::{MemoryId, SignalId, MAX_WIDTH};
