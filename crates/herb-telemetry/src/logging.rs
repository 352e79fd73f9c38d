//! Structured logging via `tracing-subscriber`.
//!
//! Log lines carry consistent fields so they can be filtered downstream:
//! - `service`: service name from configuration
//! - `operation`: contract function (createBatch, getEvent, ...)
//! - `batch_id`: batch the call refers to
//! - `tx_hash`: transaction hash for writes

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level, as with any
/// `EnvFilter`.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::Logging(e.to_string()));
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Logging(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Logging(e.to_string()))?;
    }

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );

    Ok(())
}

/// Log a transaction-related event with standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $operation:expr, $msg:expr, $tx_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            operation = $operation,
            tx_hash = %$tx_hash,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a batch-related event with standard fields.
#[macro_export]
macro_rules! log_batch_event {
    ($level:ident, $operation:expr, $msg:expr, $batch_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            operation = $operation,
            batch_id = %$batch_id,
            $($($field)*,)?
            $msg
        )
    };
}
