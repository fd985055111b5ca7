//! Telemetry settings read from `LSC_*` environment variables.

use std::env;

const DEFAULT_SERVICE: &str = "lsc-node";
const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `lsc_stakeibc=debug,info`.
    pub log_level: String,

    pub json_logs: bool,

    /// Show targets in text output.
    pub verbose: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE.to_string(),
            log_level: DEFAULT_DIRECTIVE.to_string(),
            json_logs: false,
            verbose: false,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    ///
    /// JSON output defaults on when a container runtime variable is set.
    /// The filter directive falls back to `RUST_LOG`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let containerized = ["KUBERNETES_SERVICE_HOST", "DOCKER_CONTAINER"]
            .iter()
            .any(|key| lookup(key).is_some());
        let defaults = Self::default();

        Self {
            service_name: lookup("LSC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("LSC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("LSC_JSON_LOGS").map_or(containerized, |v| is_truthy(&v)),
            verbose: lookup("LSC_LOG_VERBOSE").is_some_and(|v| is_truthy(&v)),
        }
    }

    pub fn with_log_level(self, level: impl Into<String>) -> Self {
        Self {
            log_level: level.into(),
            ..self
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}
