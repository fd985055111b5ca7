//! # lsc-node
//!
//! Runs the coordinator on a local block clock: one empty block every
//! `block_time_ms`, block time advancing by the same amount. Committed events
//! are logged as JSON lines at debug level.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Install logging and register metrics
//! 3. Mount the store (genesis, migrations)
//! 4. Produce blocks until Ctrl+C, then dump the metrics exposition

use std::time::Duration;

use anyhow::{Context, Result};
use lsc_node_runtime::{MigrationRegistry, NodeConfig, NodeRuntime};
use lsc_ledger_store::Store;
use lsc_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_bus::{EventFilter, EventSubscriber};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env();
    let block_interval = Duration::from_millis(config.block_time_ms);
    let mut runtime = NodeRuntime::mount(config, Store::in_memory(), &MigrationRegistry::new())
        .context("Failed to mount node runtime")?;

    let mut events = runtime.bus().subscribe(EventFilter::all());
    tokio::spawn(async move {
        while let Some(committed) = events.recv().await {
            match committed.to_json() {
                Ok(line) => debug!(target: "lsc_events", "{line}"),
                Err(e) => warn!(error = %e, "Unencodable event"),
            }
        }
    });

    info!("===========================================");
    info!("  Liquid Staking Coordinator v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(admins = runtime.config().params.admins.len(), "Node is running. Press Ctrl+C to stop.");

    let mut ticker = tokio::time::interval(block_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let header = runtime.next_header();
                if let Err(e) = runtime.execute_block(header, Vec::new()).await {
                    error!(height = header.height, error = %e, "Block execution failed");
                    return Err(e).context("Block clock stopped");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                break;
            }
        }
    }

    match encode_metrics() {
        Ok(exposition) => debug!(target: "lsc_metrics", "{exposition}"),
        Err(e) => warn!(error = %e, "Metrics unavailable at shutdown"),
    }
    info!(height = runtime.last_header().height, "Shutdown complete");
    Ok(())
}
