//! Inbound hook port implemented by epoch consumers.

use crate::domain::EpochTick;
use lsc_ledger_store::BlockContext;

/// Receives every `AfterEpochEnd` in the block that produced it.
///
/// Implementations must not fail the block; they log and skip their own
/// per-item errors.
pub trait EpochHooks {
    fn after_epoch_end(&self, ctx: &mut BlockContext<'_>, tick: &EpochTick);
}

/// Hooks that ignore every tick.
pub struct NoopHooks;

impl EpochHooks for NoopHooks {
    fn after_epoch_end(&self, _ctx: &mut BlockContext<'_>, _tick: &EpochTick) {}
}
