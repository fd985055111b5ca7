use serde::{Deserialize, Serialize};
use shared_types::{Dec, Int};

/// A host-chain validator in a zone's delegation set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub name: String,
    pub weight: u64,
    /// Native tokens delegated, as last confirmed by a callback or query.
    pub delegation: Int,
    pub shares_to_tokens_rate: Dec,
    /// Delegation change since the last exchange-rate query.
    pub slash_query_progress_tracker: Int,
    pub slash_query_checkpoint: Int,
    pub delegation_changes_in_progress: u32,
    pub slash_query_in_progress: bool,
}

impl Validator {
    pub fn new(address: impl Into<String>, name: impl Into<String>, weight: u64) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            weight,
            delegation: Int::zero(),
            shares_to_tokens_rate: Dec::one(),
            slash_query_progress_tracker: Int::zero(),
            slash_query_checkpoint: Int::zero(),
            delegation_changes_in_progress: 0,
            slash_query_in_progress: false,
        }
    }

    /// Only weighted validators receive new delegations.
    pub fn is_delegation_eligible(&self) -> bool {
        self.weight > 0
    }

    pub fn needs_slash_query(&self) -> bool {
        !self.slash_query_in_progress
            && !self.slash_query_progress_tracker.is_zero()
            && self.slash_query_progress_tracker >= self.slash_query_checkpoint
    }

    pub fn begin_change(&mut self) {
        self.delegation_changes_in_progress = self.delegation_changes_in_progress.saturating_add(1);
    }

    /// Returns false when no change was outstanding.
    pub fn end_change(&mut self) -> bool {
        match self.delegation_changes_in_progress.checked_sub(1) {
            Some(remaining) => {
                self.delegation_changes_in_progress = remaining;
                true
            }
            None => false,
        }
    }
}
