//! Scheduling regions and the bounded fixed-point driver.
//!
//! Every region follows the same shape: evaluate triggers, run the blocks
//! they select, and repeat until a pass reports no activity. [`converge`]
//! implements that loop once, with the iteration bound that turns a
//! combinational cycle or an oscillating design into
//! [`SimError::ConvergenceFailure`] instead of a hang.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Default per-region iteration bound.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// A scheduling region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Time-zero settle region, run once when the kernel is built.
    Stl,
    /// Input-combinational region.
    Ico,
    /// Active region.
    Act,
    /// Non-blocking-assignment region.
    Nba,
}

impl Region {
    /// Short label used in trigger descriptions and logs.
    pub fn label(self) -> &'static str {
        match self {
            Region::Stl => "stl",
            Region::Ico => "ico",
            Region::Act => "act",
            Region::Nba => "nba",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Stl => "settle",
            Region::Ico => "input combinational",
            Region::Act => "active",
            Region::Nba => "NBA",
        };
        f.write_str(name)
    }
}

/// Runs `pass` until it returns `false`, at most `limit` times.
///
/// `pass` receives the shared state and a flag that is `true` only on the
/// first call. It returns `true` when it did work and the region must be
/// evaluated again. Returns the number of passes executed; a pass number
/// beyond `limit` yields [`SimError::ConvergenceFailure`].
pub fn converge<S, F>(state: &mut S, region: Region, limit: u32, mut pass: F) -> Result<u32, SimError>
where
    F: FnMut(&mut S, bool) -> Result<bool, SimError>,
{
    let mut iterations = 0u32;
    let mut first = true;
    loop {
        if iterations >= limit {
            tracing::warn!(%region, limit, "region did not converge");
            return Err(SimError::ConvergenceFailure { region, limit });
        }
        iterations += 1;
        let again = pass(state, first)?;
        first = false;
        if !again {
            tracing::trace!(%region, iterations, "region converged");
            return Ok(iterations);
        }
    }
}
