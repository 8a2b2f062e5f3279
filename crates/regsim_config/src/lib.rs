//! Parsing and validation of `regsim.toml` run configuration.
//!
//! The file sets the kernel's iteration bound and describes a batch run:
//! which design to build, which clock to toggle, how many cycles to run,
//! which signals to print, and a per-cycle stimulus list.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_run, ResolvedRun, RunOverrides};
pub use types::*;
