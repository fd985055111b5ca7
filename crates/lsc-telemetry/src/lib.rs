//! # LSC Telemetry
//!
//! Structured logs and Prometheus metrics for the coordinator.
//!
//! ```text
//!   tracing macros ──▶ EnvFilter ──▶ JSON / compact fmt layer ──▶ stdout
//!   committed events ──▶ record_event ──▶ REGISTRY ──▶ encode_metrics
//! ```
//!
//! | Variable | Default | Effect |
//! |----------|---------|--------|
//! | `LSC_LOG_LEVEL` | `RUST_LOG`, then `info` | `EnvFilter` directive |
//! | `LSC_JSON_LOGS` | on inside containers | JSON log lines |
//! | `LSC_SERVICE_NAME` | `lsc-node` | Service name in the startup line |
//! | `LSC_LOG_VERBOSE` | off | Targets in text logs |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    encode_metrics, record_event, register_metrics, BLOCKS_EXECUTED, BLOCK_EXECUTION_DURATION, BLOCK_HEIGHT,
    CALLBACKS_RESOLVED, EPOCH_TICKS, EVENTS_EMITTED, HOST_ZONES_HALTED, INVARIANT_VIOLATIONS, LIQUID_STAKE_VOLUME,
    REDEMPTIONS, REDEMPTION_RATE, TRANSACTIONS,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("log subscriber: {0}")]
    LoggingInit(String),

    #[error("metrics registry: {0}")]
    MetricsInit(String),

    #[error("telemetry config: {0}")]
    Config(String),
}

/// Registers metrics, then installs the global log subscriber. Call once
/// per process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    tracing::info!(service = %config.service_name, json = config.json_logs, "Telemetry ready");
    Ok(())
}
