//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::RegsimConfig;
use std::collections::BTreeSet;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "regsim.toml";

/// Loads and validates `regsim.toml` from a directory.
pub fn load_config(dir: &Path) -> Result<RegsimConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<RegsimConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<RegsimConfig, ConfigError> {
    let config: RegsimConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks values that are invalid regardless of which design is run.
pub fn validate_config(config: &RegsimConfig) -> Result<(), ConfigError> {
    if config.kernel.max_iterations == 0 {
        return Err(ConfigError::ValidationError(
            "kernel.max_iterations must be at least 1".to_string(),
        ));
    }
    if config.run.design.as_deref() == Some("") {
        return Err(ConfigError::MissingField("run.design".to_string()));
    }
    if config.run.clock.as_deref() == Some("") {
        return Err(ConfigError::MissingField("run.clock".to_string()));
    }
    let mut seen = BTreeSet::new();
    for name in &config.run.watch {
        if name.is_empty() {
            return Err(ConfigError::ValidationError(
                "run.watch contains an empty name".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "run.watch lists '{name}' twice"
            )));
        }
    }
    for (i, stim) in config.run.stimulus.iter().enumerate() {
        if stim.signal.is_empty() {
            return Err(ConfigError::MissingField(format!("run.stimulus[{i}].signal")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_CYCLES, DEFAULT_MAX_ITERATIONS};

    #[test]
    fn empty_file_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.kernel.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.run.cycles, DEFAULT_CYCLES);
        assert!(config.run.design.is_none());
        assert!(config.run.stimulus.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[kernel]
max_iterations = 50

[run]
design = "axi4_lite_slave"
clock = "TOP.ACLK"
cycles = 8
watch = ["TOP.RDATA", "TOP.RVALID"]

[[run.stimulus]]
cycle = 0
signal = "TOP.ARESETn"
value = 0

[[run.stimulus]]
cycle = 2
signal = "TOP.ARESETn"
value = 1
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.kernel.max_iterations, 50);
        assert_eq!(config.run.design.as_deref(), Some("axi4_lite_slave"));
        assert_eq!(config.run.clock.as_deref(), Some("TOP.ACLK"));
        assert_eq!(config.run.cycles, 8);
        assert_eq!(config.run.watch, vec!["TOP.RDATA", "TOP.RVALID"]);
        assert_eq!(config.run.stimulus.len(), 2);
        assert_eq!(config.run.stimulus[1].cycle, 2);
        assert_eq!(config.run.stimulus[1].value, 1);
    }

    #[test]
    fn zero_iterations_rejected() {
        let err = load_config_from_str("[kernel]\nmax_iterations = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_design_rejected() {
        let err = load_config_from_str("[run]\ndesign = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "run.design"));
    }

    #[test]
    fn duplicate_watch_rejected() {
        let err = load_config_from_str("[run]\nwatch = [\"TOP.q\", \"TOP.q\"]\n").unwrap_err();
        assert!(err.to_string().contains("'TOP.q' twice"));
    }

    #[test]
    fn stimulus_without_signal_rejected() {
        let toml = r#"
[[run.stimulus]]
cycle = 0
signal = ""
value = 1
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(f) if f == "run.stimulus[0].signal"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn wrong_value_type_errors() {
        let err = load_config_from_str("[run]\ncycles = \"many\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[run]\ndesign = \"and_gate\"\ncycles = 3\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.run.design.as_deref(), Some("and_gate"));
        assert_eq!(config.run.cycles, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
