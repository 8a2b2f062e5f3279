//! Clock-driving test harness.
//!
//! [`Harness`] wraps a [`SimKernel`] with the sequence a testbench repeats
//! for every cycle: drive inputs by name, toggle the clock with one step per
//! level, then sample outputs.

use crate::error::SimError;
use crate::kernel::{SimKernel, StepReport};
use crate::value::SignalId;

/// Drives a kernel cycle by cycle.
pub struct Harness {
    kernel: SimKernel,
    clock: Option<SignalId>,
    cycle: u64,
}

impl Harness {
    /// Wraps `kernel` without a clock; only [`poke`](Self::poke),
    /// [`peek`](Self::peek) and [`settle`](Self::settle) are usable.
    pub fn new(kernel: SimKernel) -> Self {
        Self {
            kernel,
            clock: None,
            cycle: 0,
        }
    }

    /// Wraps `kernel` and drives `clock` (a full name such as `TOP.clk`).
    pub fn with_clock(kernel: SimKernel, clock: &str) -> Result<Self, SimError> {
        let id = kernel.signal_id(clock)?;
        let width = kernel.lookup(clock)?.width;
        if width != 1 {
            return Err(SimError::design(format!(
                "clock '{clock}' must be 1 bit wide, found {width}"
            )));
        }
        Ok(Self {
            kernel,
            clock: Some(id),
            cycle: 0,
        })
    }

    /// Writes an input by name. Takes effect at the next step.
    pub fn poke(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        self.kernel.write_by_name(name, value)
    }

    /// Reads any scalar variable by name.
    pub fn peek(&self, name: &str) -> Result<u64, SimError> {
        self.kernel.read_by_name(name)
    }

    /// Runs one step without touching the clock.
    pub fn settle(&mut self) -> Result<StepReport, SimError> {
        self.kernel.step()
    }

    /// Runs one full clock cycle: low then high, one step per level.
    ///
    /// Returns the report of the rising-edge step.
    pub fn tick(&mut self) -> Result<StepReport, SimError> {
        let clock = self.clock.ok_or(SimError::NoClock)?;
        self.kernel.write(clock, 0)?;
        self.kernel.step()?;
        self.kernel.write(clock, 1)?;
        let report = self.kernel.step()?;
        self.cycle += 1;
        tracing::trace!(cycle = self.cycle, "tick");
        Ok(report)
    }

    /// Runs `count` clock cycles, stopping at the first error.
    pub fn ticks(&mut self, count: u64) -> Result<(), SimError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Pulses an active-low reset: drives `name` low for one cycle, then high.
    pub fn reset(&mut self, name: &str) -> Result<(), SimError> {
        self.poke(name, 0)?;
        self.settle()?;
        self.tick()?;
        self.poke(name, 1)?;
        self.settle()?;
        Ok(())
    }

    /// Clock cycles completed so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The wrapped kernel.
    pub fn kernel(&self) -> &SimKernel {
        &self.kernel
    }

    /// Mutable access to the wrapped kernel.
    pub fn kernel_mut(&mut self) -> &mut SimKernel {
        &mut self.kernel
    }

    /// Unwraps the kernel.
    pub fn into_kernel(self) -> SimKernel {
        self.kernel
    }
}
