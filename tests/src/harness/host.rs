//! # Simulated Host Chain
//!
//! A minimal staking chain that executes the remote messages the
//! coordinator submits. Delegations are held as shares; a slash lowers the
//! validator's shares-to-tokens rate, exactly as on a real host.
//!
//! ```text
//!  transfer ──► credit receiver (ibc/ prefix stripped)
//!  ica tx ────► all messages or none ──► per-message MsgResponse
//!  clock ─────► matured unbondings credited back to the delegator
//! ```

use lsc_stakeibc::{MsgResponse, PacketPayload, RemoteMsg, SentPacket, TransferPacket};
use shared_types::{Dec, Int, SECONDS_PER_DAY};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
struct Unbonding {
    delegator: String,
    amount: Int,
    completes_at_secs: u64,
}

#[derive(Clone, Debug)]
pub struct HostChain {
    pub denom: String,
    pub unbonding_secs: u64,
    balances: BTreeMap<(String, String), Int>,
    /// `(delegator, validator)` → shares.
    shares: BTreeMap<(String, String), Dec>,
    rates: BTreeMap<String, Dec>,
    rewards: BTreeMap<String, Int>,
    /// Delegator → account receiving withdrawn rewards.
    reward_recipients: BTreeMap<String, String>,
    unbondings: Vec<Unbonding>,
}

impl HostChain {
    pub fn new(denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            unbonding_secs: SECONDS_PER_DAY,
            balances: BTreeMap::new(),
            shares: BTreeMap::new(),
            rates: BTreeMap::new(),
            rewards: BTreeMap::new(),
            reward_recipients: BTreeMap::new(),
            unbondings: Vec::new(),
        }
    }

    pub fn set_reward_recipient(&mut self, delegator: &str, recipient: &str) {
        self.reward_recipients
            .insert(delegator.to_string(), recipient.to_string());
    }

    pub fn balance(&self, address: &str, denom: &str) -> Int {
        self.balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn native_balance(&self, address: &str) -> Int {
        self.balance(address, &self.denom)
    }

    pub fn rate(&self, validator: &str) -> Dec {
        self.rates.get(validator).copied().unwrap_or_else(Dec::one)
    }

    /// Lowers (or raises) a validator's exchange rate.
    pub fn set_rate(&mut self, validator: &str, rate: Dec) {
        self.rates.insert(validator.to_string(), rate);
    }

    pub fn accrue_reward(&mut self, validator: &str, amount: u128) {
        *self.rewards.entry(validator.to_string()).or_default() += Int::new(amount);
    }

    pub fn delegator_shares(&self, delegator: &str, validator: &str) -> Dec {
        self.shares
            .get(&(delegator.to_string(), validator.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Tokens currently backing a delegation.
    pub fn delegation(&self, delegator: &str, validator: &str) -> Int {
        self.delegator_shares(delegator, validator)
            .checked_mul(self.rate(validator))
            .map(|tokens| tokens.to_uint_floor())
            .unwrap_or_default()
    }

    /// Credits unbondings that completed by `now_secs`.
    pub fn mature_unbondings(&mut self, now_secs: u64) {
        let (done, pending): (Vec<_>, Vec<_>) = self
            .unbondings
            .drain(..)
            .partition(|unbonding| unbonding.completes_at_secs <= now_secs);
        self.unbondings = pending;
        for unbonding in done {
            let denom = self.denom.clone();
            self.credit(&unbonding.delegator, &denom, unbonding.amount);
        }
    }

    /// Executes one relayed packet at `now_secs`. An error is the reason of
    /// an error acknowledgement; host state is untouched in that case.
    pub fn execute(&mut self, sent: &SentPacket, now_secs: u64) -> Result<Vec<MsgResponse>, String> {
        self.mature_unbondings(now_secs);
        let mut next = self.clone();
        let responses = match &sent.packet.payload {
            PacketPayload::Transfer(transfer) => {
                next.receive_transfer(transfer);
                vec![MsgResponse::Empty]
            }
            PacketPayload::IcaTx(msgs) => msgs
                .iter()
                .map(|msg| next.apply(msg, now_secs))
                .collect::<Result<Vec<_>, _>>()?,
        };
        *self = next;
        Ok(responses)
    }

    fn receive_transfer(&mut self, transfer: &TransferPacket) {
        let denom = transfer
            .denom
            .strip_prefix("ibc/")
            .unwrap_or(&transfer.denom)
            .to_string();
        self.credit(&transfer.receiver, &denom, transfer.amount);
    }

    fn credit(&mut self, address: &str, denom: &str, amount: Int) {
        *self
            .balances
            .entry((address.to_string(), denom.to_string()))
            .or_default() += amount;
    }

    fn debit(&mut self, address: &str, denom: &str, amount: Int) -> Result<(), String> {
        let balance = self
            .balances
            .entry((address.to_string(), denom.to_string()))
            .or_default();
        let held = *balance;
        *balance = held
            .checked_sub(amount)
            .map_err(|_| format!("{address} holds {held} {denom}, needs {amount}"))?;
        Ok(())
    }

    fn shares_for(&self, validator: &str, tokens: Int) -> Result<Dec, String> {
        Dec::from_ratio(tokens, 1u128)
            .checked_div(self.rate(validator))
            .map_err(|e| e.to_string())
    }

    fn add_shares(&mut self, delegator: &str, validator: &str, shares: Dec) -> Result<(), String> {
        let entry = self
            .shares
            .entry((delegator.to_string(), validator.to_string()))
            .or_default();
        *entry = entry.checked_add(shares).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn remove_shares(&mut self, delegator: &str, validator: &str, shares: Dec) -> Result<(), String> {
        let entry = self
            .shares
            .entry((delegator.to_string(), validator.to_string()))
            .or_default();
        *entry = entry
            .checked_sub(shares)
            .map_err(|_| format!("{delegator} has too few shares in {validator}"))?;
        Ok(())
    }

    fn apply(&mut self, msg: &RemoteMsg, now_secs: u64) -> Result<MsgResponse, String> {
        match msg {
            RemoteMsg::Delegate {
                delegator,
                validator,
                amount,
            } => {
                self.debit(delegator, &amount.denom, amount.amount)?;
                let shares = self.shares_for(validator, amount.amount)?;
                self.add_shares(delegator, validator, shares)?;
                Ok(MsgResponse::Empty)
            }
            RemoteMsg::Undelegate {
                delegator,
                validator,
                amount,
            } => {
                let shares = self.shares_for(validator, amount.amount)?;
                self.remove_shares(delegator, validator, shares)?;
                let completes_at_secs = now_secs + self.unbonding_secs;
                self.unbondings.push(Unbonding {
                    delegator: delegator.clone(),
                    amount: amount.amount,
                    completes_at_secs,
                });
                Ok(MsgResponse::Undelegate {
                    completion_time_secs: completes_at_secs,
                })
            }
            RemoteMsg::Redelegate {
                delegator,
                src_validator,
                dst_validator,
                amount,
            } => {
                let src_shares = self.shares_for(src_validator, amount.amount)?;
                self.remove_shares(delegator, src_validator, src_shares)?;
                let dst_shares = self.shares_for(dst_validator, amount.amount)?;
                self.add_shares(delegator, dst_validator, dst_shares)?;
                Ok(MsgResponse::Empty)
            }
            RemoteMsg::WithdrawReward { delegator, validator } => {
                let amount = self.rewards.remove(validator).unwrap_or_default();
                let recipient = self
                    .reward_recipients
                    .get(delegator)
                    .cloned()
                    .unwrap_or_else(|| delegator.clone());
                let denom = self.denom.clone();
                self.credit(&recipient, &denom, amount);
                Ok(MsgResponse::WithdrawReward { amount })
            }
            RemoteMsg::BankSend { from, to, amount } => {
                self.debit(from, &amount.denom, amount.amount)?;
                self.credit(to, &amount.denom, amount.amount);
                Ok(MsgResponse::Empty)
            }
            RemoteMsg::RedeemTokensForShares { delegator, amount } => {
                let validator = amount
                    .denom
                    .split('/')
                    .next()
                    .ok_or_else(|| format!("{} is not a tokenized share", amount.denom))?
                    .to_string();
                self.debit(delegator, &amount.denom, amount.amount)?;
                self.add_shares(delegator, &validator, Dec::from_ratio(amount.amount, 1u128))?;
                Ok(MsgResponse::Empty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsc_stakeibc::OutboundPacket;
    use shared_types::Coin;

    fn ica_tx(msgs: Vec<RemoteMsg>) -> SentPacket {
        SentPacket {
            sequence: 1,
            packet: OutboundPacket {
                connection_id: "connection-0".into(),
                port_id: "icacontroller-gaia.DELEGATION".into(),
                channel_id: "channel-1".into(),
                payload: PacketPayload::IcaTx(msgs),
                timeout_nanos: u64::MAX,
            },
        }
    }

    fn funded_host() -> HostChain {
        let mut host = HostChain::new("uatom");
        host.credit("cosmos1d", "uatom", Int::new(1_000));
        host
    }

    fn delegate(amount: u128) -> RemoteMsg {
        RemoteMsg::Delegate {
            delegator: "cosmos1d".into(),
            validator: "val1".into(),
            amount: Coin::new(amount, "uatom"),
        }
    }

    #[test]
    fn test_failed_tx_leaves_state_untouched() {
        let mut host = funded_host();
        let result = host.execute(&ica_tx(vec![delegate(600), delegate(600)]), 0);
        assert!(result.is_err());
        assert_eq!(host.native_balance("cosmos1d"), Int::new(1_000));
        assert!(host.delegation("cosmos1d", "val1").is_zero());
    }

    #[test]
    fn test_slash_lowers_delegation_tokens() {
        let mut host = funded_host();
        host.execute(&ica_tx(vec![delegate(1_000)]), 0).unwrap();
        host.set_rate("val1", Dec::percent(99));
        assert_eq!(host.delegation("cosmos1d", "val1"), Int::new(990));
        assert_eq!(host.delegator_shares("cosmos1d", "val1"), Dec::from_ratio(1_000u128, 1u128));
    }

    #[test]
    fn test_unbonding_matures_after_period() {
        let mut host = funded_host();
        host.execute(&ica_tx(vec![delegate(1_000)]), 0).unwrap();
        let responses = host
            .execute(
                &ica_tx(vec![RemoteMsg::Undelegate {
                    delegator: "cosmos1d".into(),
                    validator: "val1".into(),
                    amount: Coin::new(400u128, "uatom"),
                }]),
                10,
            )
            .unwrap();
        assert_eq!(
            responses,
            vec![MsgResponse::Undelegate {
                completion_time_secs: 10 + SECONDS_PER_DAY
            }]
        );
        host.mature_unbondings(SECONDS_PER_DAY);
        assert!(host.native_balance("cosmos1d").is_zero());
        host.mature_unbondings(10 + SECONDS_PER_DAY);
        assert_eq!(host.native_balance("cosmos1d"), Int::new(400));
    }
}
