//! Prometheus metrics for the coordinator.
//!
//! Names follow `lsc_<area>_<metric>[_<unit>]`. Runtime metrics are set by
//! the block executor; everything else is derived from committed events
//! through [`record_event`].

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use shared_types::StakeEvent;
use std::time::Instant;

use crate::TelemetryError;

// Names and label sets below are compile-time constants; construction only
// fails on malformed names.
fn counter(name: &str, help: &str) -> Counter {
    Counter::new(name, help).expect("static counter definition")
}

fn gauge(name: &str, help: &str) -> Gauge {
    Gauge::new(name, help).expect("static gauge definition")
}

fn counter_by(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("static counter definition")
}

fn gauge_by(name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    GaugeVec::new(Opts::new(name, help), labels).expect("static gauge definition")
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // runtime
    pub static ref BLOCKS_EXECUTED: Counter =
        counter("lsc_runtime_blocks_executed_total", "Blocks committed");
    pub static ref BLOCK_HEIGHT: Gauge =
        gauge("lsc_runtime_block_height", "Height of the last committed block");
    pub static ref BLOCK_EXECUTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("lsc_runtime_block_execution_duration_seconds", "Wall time per block")
            .buckets(exponential_buckets(0.0001, 2.0, 15).expect("static bucket layout")),
    )
    .expect("static histogram definition");
    /// `outcome` is `applied` or `rejected`.
    pub static ref TRANSACTIONS: CounterVec =
        counter_by("lsc_runtime_transactions_total", "Transactions by kind and outcome", &["kind", "outcome"]);
    pub static ref INVARIANT_VIOLATIONS: Counter =
        counter("lsc_stakeibc_invariant_violations_total", "Zones halted by the end-of-block sweep");

    // committed events
    pub static ref EVENTS_EMITTED: CounterVec =
        counter_by("lsc_events_emitted_total", "Committed events by kind", &["kind"]);
    pub static ref EPOCH_TICKS: CounterVec =
        counter_by("lsc_epochs_ticks_total", "Epoch ends by identifier", &["identifier"]);
    /// `outcome` is `success`, `failure` or `timeout`.
    pub static ref CALLBACKS_RESOLVED: CounterVec = counter_by(
        "lsc_callbacks_resolved_total",
        "Remote call resolutions by callback kind",
        &["callback_id", "outcome"],
    );

    // per host zone
    pub static ref LIQUID_STAKE_VOLUME: CounterVec =
        counter_by("lsc_stakeibc_liquid_stake_volume_total", "Native base units liquid staked", &["chain_id"]);
    pub static ref REDEMPTIONS: CounterVec =
        counter_by("lsc_stakeibc_redemptions_total", "Accepted redemption requests", &["chain_id"]);
    pub static ref REDEMPTION_RATE: GaugeVec =
        gauge_by("lsc_stakeibc_redemption_rate", "Latest committed redemption rate", &["chain_id"]);
    pub static ref HOST_ZONES_HALTED: GaugeVec =
        gauge_by("lsc_stakeibc_host_zone_halted", "1 while the zone is halted", &["chain_id"]);
}

fn collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(BLOCKS_EXECUTED.clone()),
        Box::new(BLOCK_HEIGHT.clone()),
        Box::new(BLOCK_EXECUTION_DURATION.clone()),
        Box::new(TRANSACTIONS.clone()),
        Box::new(INVARIANT_VIOLATIONS.clone()),
        Box::new(EVENTS_EMITTED.clone()),
        Box::new(EPOCH_TICKS.clone()),
        Box::new(CALLBACKS_RESOLVED.clone()),
        Box::new(LIQUID_STAKE_VOLUME.clone()),
        Box::new(REDEMPTIONS.clone()),
        Box::new(REDEMPTION_RATE.clone()),
        Box::new(HOST_ZONES_HALTED.clone()),
    ]
}

/// Adds every metric to [`REGISTRY`]. Idempotent.
pub fn register_metrics() -> Result<(), TelemetryError> {
    collectors()
        .into_iter()
        .try_for_each(|collector| match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
            Err(e) => Err(TelemetryError::MetricsInit(e.to_string())),
        })
}

/// Prometheus text exposition of [`REGISTRY`].
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let mut text = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut text)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(text).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

pub fn record_event(event: &StakeEvent) {
    EVENTS_EMITTED.with_label_values(&[event.kind()]).inc();
    match event {
        StakeEvent::LiquidStake {
            chain_id,
            native_amount,
            ..
        } => LIQUID_STAKE_VOLUME
            .with_label_values(&[chain_id.as_str()])
            .inc_by(native_amount.u128() as f64),
        StakeEvent::RedeemStake { chain_id, .. } => REDEMPTIONS.with_label_values(&[chain_id.as_str()]).inc(),
        StakeEvent::EpochEnded { identifier, .. } => EPOCH_TICKS.with_label_values(&[identifier.as_str()]).inc(),
        StakeEvent::CallbackResolved {
            callback_id,
            outcome,
            ..
        } => CALLBACKS_RESOLVED
            .with_label_values(&[callback_id.as_str(), outcome.as_str()])
            .inc(),
        StakeEvent::RedemptionRateUpdated { chain_id, current, .. } => {
            // Decimal renders exactly; f64 is only for the gauge.
            if let Ok(rate) = current.to_string().parse::<f64>() {
                REDEMPTION_RATE.with_label_values(&[chain_id.as_str()]).set(rate);
            }
        }
        StakeEvent::HostZoneHalted { chain_id, .. } => HOST_ZONES_HALTED.with_label_values(&[chain_id.as_str()]).set(1.0),
        StakeEvent::HostZoneResumed { chain_id } => HOST_ZONES_HALTED.with_label_values(&[chain_id.as_str()]).set(0.0),
        _ => {}
    }
}

/// Observes the elapsed wall time into a histogram when dropped.
pub struct HistogramTimer {
    target: Histogram,
    started: Instant,
}

impl HistogramTimer {
    pub fn new(target: &Histogram) -> Self {
        Self {
            target: target.clone(),
            started: Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.target.observe(self.started.elapsed().as_secs_f64());
    }
}

/// `let _timer = time_histogram!(BLOCK_EXECUTION_DURATION);`
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
