//! Simulation error types for the region-scheduled kernel.
//!
//! All errors that can occur during design construction or stepping are
//! represented as variants of [`SimError`].

use crate::region::Region;

/// Errors that can occur while building or stepping a design.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A value does not fit in the declared bit width of its target.
    ///
    /// The write is rejected and the target keeps its previous value.
    #[error("value {value:#x} exceeds the {width}-bit width of '{name}'")]
    WidthViolation {
        /// Name of the signal or memory that rejected the write.
        name: String,
        /// Declared width in bits.
        width: u32,
        /// The rejected value.
        value: u64,
    },

    /// A region did not reach a fixed point within the iteration bound.
    ///
    /// This indicates a combinational cycle or oscillating logic in the
    /// design. The step is aborted and rolled back to its state at entry.
    #[error("{region} region did not converge within {limit} iterations")]
    ConvergenceFailure {
        /// The region whose loop exceeded the bound.
        region: Region,
        /// The configured iteration bound.
        limit: u32,
    },

    /// A lookup by name found no registered variable.
    #[error("unknown signal '{name}'")]
    UnknownSignal {
        /// The name that was looked up.
        name: String,
    },

    /// An indexed access went past the end of a memory.
    #[error("index {index} out of range for '{name}' (depth {depth})")]
    IndexOutOfRange {
        /// Name of the memory.
        name: String,
        /// The offending index.
        index: u32,
        /// Number of words in the memory.
        depth: u32,
    },

    /// A write targeted a read-only variable such as a parameter.
    #[error("'{name}' is read-only")]
    ReadOnly {
        /// Name of the read-only variable.
        name: String,
    },

    /// An indexed access targeted a scalar variable.
    #[error("'{name}' is not a memory")]
    NotAMemory {
        /// Name of the variable.
        name: String,
    },

    /// A scalar access targeted a memory.
    #[error("'{name}' is a memory; use an indexed access")]
    NotAScalar {
        /// Name of the variable.
        name: String,
    },

    /// A clocked harness operation was used without a clock signal.
    #[error("no clock signal configured")]
    NoClock,

    /// Simulation state could not be serialized.
    #[error("failed to encode {what}: {reason}")]
    Encoding {
        /// What was being encoded.
        what: &'static str,
        /// Encoder message.
        reason: String,
    },

    /// The design description is malformed.
    #[error("invalid design: {reason}")]
    Design {
        /// Description of what is wrong with the design.
        reason: String,
    },
}

impl SimError {
    /// Returns `true` if this error aborts the current step.
    ///
    /// Only convergence failures are fatal; every other variant rejects a
    /// single operation and leaves the kernel usable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::ConvergenceFailure { .. })
    }

    pub(crate) fn design(reason: impl Into<String>) -> Self {
        SimError::Design {
            reason: reason.into(),
        }
    }
}
