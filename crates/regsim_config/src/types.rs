//! Configuration types deserialized from `regsim.toml`.

use serde::Deserialize;

/// Default per-region iteration bound.
///
/// Mirrors `regsim_kernel::DEFAULT_MAX_ITERATIONS`; this crate does not
/// depend on the kernel, so the CLI tests check that the two agree.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Default number of clock cycles for a batch run.
pub const DEFAULT_CYCLES: u64 = 10;

/// The top-level configuration parsed from `regsim.toml`.
///
/// Every table is optional; an empty file yields the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct RegsimConfig {
    /// Kernel tunables.
    #[serde(default)]
    pub kernel: KernelSection,
    /// Batch run description.
    #[serde(default)]
    pub run: RunConfig,
}

/// The `[kernel]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KernelSection {
    /// Iteration bound applied to every region loop.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// The `[run]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Reference design to build, by module name.
    #[serde(default)]
    pub design: Option<String>,
    /// Full name of the clock input, e.g. `TOP.ACLK`.
    #[serde(default)]
    pub clock: Option<String>,
    /// Number of clock cycles (or plain steps without a clock).
    #[serde(default = "default_cycles")]
    pub cycles: u64,
    /// Signals printed after every cycle.
    #[serde(default)]
    pub watch: Vec<String>,
    /// Inputs applied before a given cycle.
    #[serde(default)]
    pub stimulus: Vec<Stimulus>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            design: None,
            clock: None,
            cycles: DEFAULT_CYCLES,
            watch: Vec::new(),
            stimulus: Vec::new(),
        }
    }
}

/// One `[[run.stimulus]]` entry: drive `signal` to `value` before `cycle`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stimulus {
    /// Zero-based cycle index.
    pub cycle: u64,
    /// Full signal name.
    pub signal: String,
    /// Value to write.
    pub value: u64,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_cycles() -> u64 {
    DEFAULT_CYCLES
}
