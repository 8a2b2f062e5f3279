//! Run resolution: merging command-line overrides over the `[run]` table.

use crate::error::ConfigError;
use crate::types::{RegsimConfig, Stimulus};
use std::collections::BTreeMap;

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    /// Design name.
    pub design: Option<String>,
    /// Cycle count.
    pub cycles: Option<u64>,
}

/// A batch run with every default and override applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRun {
    /// Design name, checked against the known designs.
    pub design: String,
    /// Clock input, if the run toggles one.
    pub clock: Option<String>,
    /// Number of cycles.
    pub cycles: u64,
    /// Signals printed per cycle.
    pub watch: Vec<String>,
    /// Stimulus grouped by cycle, in file order within a cycle.
    pub stimulus: BTreeMap<u64, Vec<Stimulus>>,
    /// Kernel iteration bound.
    pub max_iterations: u32,
}

impl ResolvedRun {
    /// Stimulus entries to apply before `cycle`.
    pub fn stimulus_at(&self, cycle: u64) -> &[Stimulus] {
        self.stimulus.get(&cycle).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Resolves the run to execute.
///
/// `known_designs` is the list of design names the caller can build.
pub fn resolve_run(
    config: &RegsimConfig,
    overrides: &RunOverrides,
    known_designs: &[&str],
) -> Result<ResolvedRun, ConfigError> {
    let design = overrides
        .design
        .clone()
        .or_else(|| config.run.design.clone())
        .ok_or_else(|| ConfigError::MissingField("run.design".to_string()))?;
    if !known_designs.contains(&design.as_str()) {
        return Err(ConfigError::UnknownDesign(design));
    }

    let cycles = overrides.cycles.unwrap_or(config.run.cycles);
    let mut stimulus: BTreeMap<u64, Vec<Stimulus>> = BTreeMap::new();
    for stim in &config.run.stimulus {
        if stim.cycle >= cycles {
            return Err(ConfigError::ValidationError(format!(
                "stimulus for '{}' at cycle {} is outside a {cycles}-cycle run",
                stim.signal, stim.cycle
            )));
        }
        stimulus.entry(stim.cycle).or_default().push(stim.clone());
    }

    Ok(ResolvedRun {
        design,
        clock: config.run.clock.clone(),
        cycles,
        watch: config.run.watch.clone(),
        stimulus,
        max_iterations: config.kernel.max_iterations,
    })
}
