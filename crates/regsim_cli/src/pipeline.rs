//! Shared steps for the subcommands: configuration lookup and kernel setup.

use std::path::Path;

use regsim_config::{RegsimConfig, CONFIG_FILE_NAME};
use regsim_kernel::{Direction, KernelConfig, SimKernel};

use crate::GlobalArgs;

/// Loads the configuration named by `--config`, else `./regsim.toml` if it
/// exists, else the defaults.
pub fn load_config(global: &GlobalArgs) -> Result<RegsimConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        return Ok(regsim_config::load_config_file(Path::new(path))?);
    }
    let cwd = std::env::current_dir()?;
    if cwd.join(CONFIG_FILE_NAME).is_file() {
        tracing::debug!(dir = %cwd.display(), "using {CONFIG_FILE_NAME}");
        Ok(regsim_config::load_config(&cwd)?)
    } else {
        Ok(RegsimConfig::default())
    }
}

/// Builds a reference design and wraps it in a settled kernel.
pub fn build_kernel(design: &str, max_iterations: u32) -> Result<SimKernel, Box<dyn std::error::Error>> {
    let design = regsim_designs::by_name(design)?;
    Ok(SimKernel::new(design, KernelConfig { max_iterations })?)
}

/// Picks the clock input of a design: the only 1-bit top-level input whose
/// name looks like a clock.
pub fn infer_clock(kernel: &SimKernel) -> Option<String> {
    let mut candidates = kernel.registry().scope("TOP").filter(|e| {
        let local = e.name.rsplit('.').next().unwrap_or("").to_lowercase();
        e.direction == Direction::Input && e.width == 1 && (local.ends_with("clk") || local == "clock")
    });
    let first = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some(first.name.clone())
}
