//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full EnvFilter directive
    pub log_level: String,

    /// Whether to write logs to the console at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "herb-trace".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: herb-trace)
    /// - `HERB_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `HERB_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `HERB_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or_else(|| "herb-trace".to_string()),

            log_level: lookup("HERB_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("HERB_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("HERB_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Override the log level, typically from a `--verbose` flag.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}
