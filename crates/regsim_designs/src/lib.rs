//! Reference designs for the regsim kernel.
//!
//! Each design is a function returning a freshly built [`Design`]. The
//! module name doubles as the internal scope, so `shift_register.q` is the
//! register behind the `TOP.q` port.

#![warn(missing_docs)]

pub mod and_gate;
pub mod axi4_lite;
pub mod shift_register;

use regsim_kernel::{Design, SimError};

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &[
    and_gate::MODULE,
    shift_register::MODULE,
    axi4_lite::MODULE,
];

/// Builds a reference design by module name.
pub fn by_name(name: &str) -> Result<Design, SimError> {
    match name {
        and_gate::MODULE => and_gate::build(),
        shift_register::MODULE => shift_register::build(),
        axi4_lite::MODULE => axi4_lite::build(),
        _ => Err(SimError::Design {
            reason: format!("unknown design '{name}' (available: {})", NAMES.join(", ")),
        }),
    }
}
