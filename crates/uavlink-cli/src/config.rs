//! CLI configuration.
//!
//! Built from environment variables at startup; command-line flags override
//! individual values afterwards.

use std::path::PathBuf;

/// Default log filter when neither `RUST_LOG` nor `UAVLINK_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime configuration of the `uavlink` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Directory holding `*.json` object definitions.
    pub definitions_dir: PathBuf,
    /// Fallback `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl CliConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable              | Default                            | Description                 |
    /// |-----------------------|------------------------------------|-----------------------------|
    /// | `UAVLINK_DEFINITIONS` | `<config dir>/uavlink/definitions` | Object definition directory |
    /// | `UAVLINK_LOG`         | `warn`                             | Fallback log filter         |
    ///
    /// Without a platform config directory the definitions default to
    /// `./definitions`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let definitions_dir = lookup("UAVLINK_DEFINITIONS")
            .filter(|v| !v.is_empty())
            .map_or_else(default_definitions_dir, PathBuf::from);

        let log_filter = lookup("UAVLINK_LOG")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            definitions_dir,
            log_filter,
        }
    }

    /// Replace the definitions directory when `dir` is given.
    pub fn with_definitions_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.definitions_dir = dir;
        }
        self
    }
}

/// `<config dir>/uavlink/definitions`, or `./definitions` when the platform
/// has no config directory.
pub fn default_definitions_dir() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from("definitions"),
        |dir| dir.join("uavlink").join("definitions"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.log_filter, "warn");
        assert_eq!(cfg.definitions_dir, default_definitions_dir());
        assert!(cfg.definitions_dir.ends_with("definitions"));
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = config_from(&[
            ("UAVLINK_DEFINITIONS", "/opt/uavlink/defs"),
            ("UAVLINK_LOG", "uavlink_objects=trace"),
        ]);
        assert_eq!(cfg.definitions_dir, PathBuf::from("/opt/uavlink/defs"));
        assert_eq!(cfg.log_filter, "uavlink_objects=trace");
    }

    #[test]
    fn empty_variables_are_ignored() {
        let cfg = config_from(&[("UAVLINK_DEFINITIONS", ""), ("UAVLINK_LOG", "")]);
        assert_eq!(cfg, config_from(&[]));
    }

    #[test]
    fn flag_overrides_environment() {
        let cfg = config_from(&[("UAVLINK_DEFINITIONS", "/env/defs")])
            .with_definitions_dir(Some(PathBuf::from("./local")));
        assert_eq!(cfg.definitions_dir, PathBuf::from("./local"));

        let unchanged =
            config_from(&[("UAVLINK_DEFINITIONS", "/env/defs")]).with_definitions_dir(None);
        assert_eq!(unchanged.definitions_dir, PathBuf::from("/env/defs"));
    }
}
