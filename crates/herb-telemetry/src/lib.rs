//! # Herb Telemetry
//!
//! Logging and metrics for the Herb-Trace ledger client.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON output
//! - **Metrics**: Prometheus counters and histograms in a private registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use herb_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//!
//!     // Ledger calls are now logged and counted
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `herb-trace` | Service name in logs |
//! | `HERB_LOG_LEVEL` | `info` | Log level filter |
//! | `HERB_JSON_LOGS` | `false` | JSON log lines |
//! | `HERB_CONSOLE_OUTPUT` | `true` | Write logs to stderr |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, QUERIES, RECEIPT_POLLS, RECEIPT_WAIT,
    REGISTRY, SUBMISSIONS,
};

use thiserror::Error;

/// Failures while wiring up logs or metrics.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("log subscriber rejected: {0}")]
    Logging(String),

    /// A metric could not be registered or encoded.
    #[error("metrics registry error: {0}")]
    Metrics(String),

    /// A telemetry setting could not be parsed.
    #[error("bad telemetry setting: {0}")]
    Config(String),
}

/// Register the ledger metrics and install the log subscriber.
///
/// Keep the returned guard alive until the process exits.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;
    tracing::debug!(service = %config.service_name, "telemetry ready");
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Marks the telemetry lifetime; dropping it logs the shutdown.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// Service name the logs are tagged with.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "telemetry stopped");
    }
}

/// Bump a counter, optionally selecting a label set first.
#[macro_export]
macro_rules! metric_inc {
    ($counter:expr) => {
        $counter.inc()
    };
    ($counter:expr, $labels:expr) => {
        $counter.with_label_values($labels).inc()
    };
}
