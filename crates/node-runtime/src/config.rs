//! # Node Configuration
//!
//! Genesis values and orchestrator parameters, with environment overrides.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LSC_GENESIS_TIME_NANOS` | `genesis_time_nanos` |
//! | `LSC_BLOCK_TIME_MS` | `block_time_ms` |
//! | `LSC_LOCAL_PREFIX` | `local_prefix` |
//! | `LSC_ICA_TIMEOUT_NANOS` | `params.ica_timeout_nanos` |
//! | `LSC_COMMISSION_BPS` | `params.stride_commission_bps` |
//! | `LSC_ADMINS` | `params.admins` (comma separated) |

use crate::error::{RuntimeError, RuntimeResult};
use lsc_epochs::EpochInfo;
use lsc_stakeibc::Params;
use serde::{Deserialize, Serialize};
use shared_types::{Coin, TimestampNanos};
use std::env;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Time at which every genesis epoch stream starts counting.
    pub genesis_time_nanos: TimestampNanos,

    /// Block interval of the local block clock.
    pub block_time_ms: u64,

    /// Bech32 prefix of local addresses and module accounts.
    pub local_prefix: String,

    /// Capacity of the committed-event bus.
    pub bus_capacity: usize,

    /// Balances minted at genesis.
    pub genesis_balances: Vec<(String, Coin)>,

    /// Orchestrator parameters.
    pub params: Params,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_time_nanos: 0,
            block_time_ms: 5_000,
            local_prefix: "stride".to_string(),
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            genesis_balances: Vec::new(),
            params: Params::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden from the environment. Unparsable values are
    /// logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = parsed("LSC_GENESIS_TIME_NANOS") {
            config.genesis_time_nanos = value;
        }
        if let Some(value) = parsed("LSC_BLOCK_TIME_MS") {
            config.block_time_ms = value;
        }
        if let Ok(prefix) = env::var("LSC_LOCAL_PREFIX") {
            config.local_prefix = prefix;
        }
        if let Some(value) = parsed("LSC_ICA_TIMEOUT_NANOS") {
            config.params.ica_timeout_nanos = value;
        }
        if let Some(value) = parsed("LSC_COMMISSION_BPS") {
            config.params.stride_commission_bps = value;
        }
        if let Ok(admins) = env::var("LSC_ADMINS") {
            config.params.admins = split_admins(&admins);
        }

        config
    }

    pub fn validate(&self) -> RuntimeResult<()> {
        if self.local_prefix.is_empty() {
            return Err(RuntimeError::Config("local_prefix is empty".to_string()));
        }
        if self.block_time_ms == 0 {
            return Err(RuntimeError::Config("block_time_ms must be positive".to_string()));
        }
        if self.bus_capacity == 0 {
            return Err(RuntimeError::Config("bus_capacity must be positive".to_string()));
        }
        self.params.validate().map_err(RuntimeError::Config)
    }

    /// Epoch streams created at genesis.
    pub fn genesis_epochs(&self) -> Vec<EpochInfo> {
        EpochInfo::genesis_epochs(self.genesis_time_nanos)
    }

    pub fn block_time_nanos(&self) -> u64 {
        self.block_time_ms.saturating_mul(1_000_000)
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable override");
            None
        }
    }
}

fn split_admins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|admin| !admin.is_empty())
        .map(str::to_string)
        .collect()
}
