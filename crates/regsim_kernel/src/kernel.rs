//! The region-scheduled evaluation kernel.
//!
//! [`SimKernel`] owns a [`Design`] and advances it one evaluation step at a
//! time. A step runs the ICO region to a fixed point, then alternates an ACT
//! fixed point with an NBA commit until a commit produces no further
//! triggers. Every loop goes through [`converge`] and is bounded by
//! [`KernelConfig::max_iterations`].

use serde::{Deserialize, Serialize};

use crate::design::{BlockContext, BlockKind, Design};
use crate::error::SimError;
use crate::nba::DelayedWriteBuffer;
use crate::region::{converge, Region, DEFAULT_MAX_ITERATIONS};
use crate::registry::{Access, Handle, Registry, Snapshot, VarEntry};
use crate::trigger::TriggerSet;
use crate::value::{MemoryId, SignalId};

/// Tunables for a kernel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Iteration bound applied to every region loop.
    pub max_iterations: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// What happened during one call to [`SimKernel::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// ICO trigger evaluations.
    pub ico_passes: u32,
    /// ACT trigger evaluations, across every ACT fixed point in the step.
    pub act_passes: u32,
    /// NBA passes that applied at least one delayed write.
    pub nba_commits: u32,
    /// Delayed writes applied across all commits.
    pub writes_committed: usize,
    /// Sequential block executions.
    pub sequential_fired: u32,
}

impl StepReport {
    /// Returns `true` if the step committed no delayed writes.
    ///
    /// Combinational activity alone still queues an NBA pass, but an empty
    /// commit is not counted.
    pub fn is_quiescent(&self) -> bool {
        self.nba_commits == 0
    }
}

/// Cumulative counters over the lifetime of a kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Successful steps.
    pub steps: u64,
    /// Steps aborted by an error.
    pub failed_steps: u64,
    /// NBA commits.
    pub nba_commits: u64,
    /// Delayed writes applied.
    pub writes_committed: u64,
    /// Sequential block executions.
    pub sequential_fired: u64,
}

/// Simulation engine for one design instance.
pub struct SimKernel {
    design: Design,
    nba_buffer: DelayedWriteBuffer,
    nba_queued: TriggerSet,
    act_first_pending: bool,
    config: KernelConfig,
    report: StepReport,
    stats: SimStats,
}

impl SimKernel {
    /// Creates a kernel and brings the design to its time-zero state.
    ///
    /// Trigger shadows start equal to the initial values, the settle region
    /// runs every input-combinational and combinational block once, and the
    /// shadows are refreshed again so the first [`step`](Self::step) only
    /// reacts to changes the harness makes.
    pub fn new(design: Design, config: KernelConfig) -> Result<Self, SimError> {
        if config.max_iterations == 0 {
            return Err(SimError::design("max_iterations must be at least 1"));
        }
        let act_len = design.act.len();
        let mut kernel = Self {
            design,
            nba_buffer: DelayedWriteBuffer::new(),
            nba_queued: TriggerSet::new(act_len),
            act_first_pending: false,
            config,
            report: StepReport::default(),
            stats: SimStats::default(),
        };
        kernel.refresh_shadows();
        converge(
            &mut kernel,
            Region::Stl,
            config.max_iterations,
            SimKernel::stl_pass,
        )?;
        kernel.refresh_shadows();
        tracing::debug!(design = %kernel.design.name, "kernel settled");
        Ok(kernel)
    }

    /// Advances the design by one evaluation step.
    ///
    /// The harness must apply every input for this step before calling. A
    /// step either completes or has no effect: on any error the store,
    /// including trigger shadows, is restored to its state at entry and
    /// staged writes are dropped. Inputs applied before the call are kept, so
    /// a retried step sees the same edges.
    pub fn step(&mut self) -> Result<StepReport, SimError> {
        self.report = StepReport::default();
        self.act_first_pending = true;
        let checkpoint = self.design.store.clone();
        match self.run_regions() {
            Ok(()) => {
                let report = std::mem::take(&mut self.report);
                self.stats.steps += 1;
                self.stats.nba_commits += u64::from(report.nba_commits);
                self.stats.writes_committed += report.writes_committed as u64;
                self.stats.sequential_fired += u64::from(report.sequential_fired);
                tracing::debug!(
                    step = self.stats.steps,
                    act_passes = report.act_passes,
                    nba_commits = report.nba_commits,
                    writes = report.writes_committed,
                    "step complete"
                );
                Ok(report)
            }
            Err(err) => {
                if let SimError::ConvergenceFailure { region, .. } = &err {
                    let active = self
                        .design
                        .act
                        .describe(&self.nba_queued)
                        .join(", ");
                    tracing::warn!(%region, queued = %active, "aborting step");
                }
                self.design.store = checkpoint;
                self.nba_buffer.discard();
                self.nba_queued.clear();
                self.stats.failed_steps += 1;
                Err(err)
            }
        }
    }

    fn run_regions(&mut self) -> Result<(), SimError> {
        let limit = self.config.max_iterations;
        converge(self, Region::Ico, limit, SimKernel::ico_pass)?;
        converge(self, Region::Nba, limit, |kernel, _| {
            converge(kernel, Region::Act, limit, SimKernel::act_pass)?;
            kernel.nba_pass()
        })?;
        Ok(())
    }

    fn stl_pass(&mut self, first: bool) -> Result<bool, SimError> {
        let active = self.design.stl.evaluate(&self.design.store, first);
        if !active.any() {
            return Ok(false);
        }
        self.design.copy_inputs()?;
        self.run_blocks(|kind, _| {
            matches!(kind, BlockKind::InputCombinational | BlockKind::Combinational)
        })?;
        self.design.copy_outputs()?;
        Ok(true)
    }

    fn ico_pass(&mut self, first: bool) -> Result<bool, SimError> {
        self.report.ico_passes += 1;
        let active = self.design.ico.evaluate(&self.design.store, first);
        if !active.any() {
            return Ok(false);
        }
        self.design.copy_inputs()?;
        self.run_blocks(|kind, _| kind == BlockKind::InputCombinational)?;
        self.design.copy_outputs()?;
        Ok(true)
    }

    fn act_pass(&mut self, _first: bool) -> Result<bool, SimError> {
        self.report.act_passes += 1;
        let first_iteration = std::mem::replace(&mut self.act_first_pending, false);
        let active = self
            .design
            .act
            .evaluate(&self.design.store, first_iteration);
        self.design
            .store
            .snapshot_previous(self.design.act.tracked_signals());
        if !active.any() {
            return Ok(false);
        }
        for desc in self.design.act.describe(&active) {
            tracing::trace!(trigger = desc, "act trigger active");
        }

        let fresh = active.and_not(&self.nba_queued);
        self.nba_queued.or_in_place(&active);

        let fired = self.run_blocks(|kind, sensitivity| match kind {
            BlockKind::Combinational => sensitivity.intersects(&active),
            BlockKind::Sequential => sensitivity.intersects(&fresh),
            BlockKind::InputCombinational => false,
        })?;
        self.report.sequential_fired += fired;
        self.design.copy_outputs()?;
        Ok(true)
    }

    fn nba_pass(&mut self) -> Result<bool, SimError> {
        if !self.nba_queued.any() {
            return Ok(false);
        }
        let applied = self.nba_buffer.commit(&mut self.design.store)?;
        self.nba_queued.clear();
        self.design.copy_outputs()?;
        if applied > 0 {
            self.report.nba_commits += 1;
            self.report.writes_committed += applied;
        }
        tracing::debug!(applied, "nba commit");
        Ok(true)
    }

    /// Runs every block selected by `select`, in region order.
    ///
    /// Returns how many sequential blocks ran.
    fn run_blocks<P>(&mut self, select: P) -> Result<u32, SimError>
    where
        P: Fn(BlockKind, &TriggerSet) -> bool,
    {
        let mut sequential = 0;
        let blocks = self
            .design
            .ico_blocks
            .iter()
            .chain(self.design.act_blocks.iter());
        for block in blocks {
            if !select(block.kind, &block.sensitivity) {
                continue;
            }
            tracing::trace!(block = %block.name, "run block");
            let mut ctx = BlockContext::new(&mut self.design.store, &mut self.nba_buffer);
            (block.body)(&mut ctx)?;
            if block.kind == BlockKind::Sequential {
                sequential += 1;
            }
        }
        Ok(sequential)
    }

    fn refresh_shadows(&mut self) {
        self.design
            .store
            .snapshot_previous(self.design.act.tracked_signals());
    }

    /// Returns the current value of a signal.
    pub fn read(&self, id: SignalId) -> u64 {
        self.design.store.read(id)
    }

    /// Writes a signal; the change takes effect at the next step.
    pub fn write(&mut self, id: SignalId, value: u64) -> Result<(), SimError> {
        self.design.store.write(id, value)
    }

    /// Looks up a registered variable.
    pub fn lookup(&self, name: &str) -> Result<&VarEntry, SimError> {
        self.design.registry.get(name)
    }

    /// Resolves a scalar signal by name.
    pub fn signal_id(&self, name: &str) -> Result<SignalId, SimError> {
        match self.lookup(name)?.handle {
            Handle::Signal(id) => Ok(id),
            Handle::Memory(_) => Err(SimError::NotAScalar { name: name.into() }),
            Handle::Const(_) => Err(SimError::ReadOnly { name: name.into() }),
        }
    }

    /// Resolves a memory by name.
    pub fn memory_id(&self, name: &str) -> Result<MemoryId, SimError> {
        match self.lookup(name)?.handle {
            Handle::Memory(id) => Ok(id),
            _ => Err(SimError::NotAMemory { name: name.into() }),
        }
    }

    /// Reads a scalar signal or constant by name.
    pub fn read_by_name(&self, name: &str) -> Result<u64, SimError> {
        match self.lookup(name)?.handle {
            Handle::Signal(id) => Ok(self.design.store.read(id)),
            Handle::Const(v) => Ok(v),
            Handle::Memory(_) => Err(SimError::NotAScalar { name: name.into() }),
        }
    }

    /// Writes a scalar signal by name.
    pub fn write_by_name(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        let entry = self.lookup(name)?;
        if entry.access == Access::ReadOnly {
            return Err(SimError::ReadOnly { name: name.into() });
        }
        let id = self.signal_id(name)?;
        self.design.store.write(id, value)
    }

    /// Reads one word of a memory by name.
    pub fn read_word_by_name(&self, name: &str, index: u32) -> Result<u64, SimError> {
        let mem = self.memory_id(name)?;
        self.design.store.read_word(mem, index)
    }

    /// Writes one word of a memory by name, bypassing the design logic.
    ///
    /// Intended for preloading memories from a harness.
    pub fn write_word_by_name(&mut self, name: &str, index: u32, value: u64) -> Result<(), SimError> {
        let mem = self.memory_id(name)?;
        self.design.store.write_word(mem, index, value)
    }

    /// Captures every registered variable.
    pub fn snapshot(&self) -> Snapshot {
        self.design.registry.snapshot(&self.design.store)
    }

    /// The name registry.
    pub fn registry(&self) -> &Registry {
        &self.design.registry
    }

    /// The simulated design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// The kernel configuration.
    pub fn config(&self) -> KernelConfig {
        self.config
    }

    /// Cumulative counters.
    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// Number of delayed writes waiting for commit. Zero between steps.
    pub fn pending_writes(&self) -> usize {
        self.nba_buffer.pending()
    }
}
