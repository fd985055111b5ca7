//! # Test Network
//!
//! One coordinator runtime wired to one simulated host, with a relayer in
//! between and the end-of-block invariants checked after every block.
//!
//! ```text
//!  ┌──────────────┐  pending packets  ┌──────────┐  execute  ┌───────────┐
//!  │ NodeRuntime  │ ─────────────────►│ relayer  │──────────►│ HostChain │
//!  │ (coordinator)│ ◄─────────────────│          │◄──────────│  (gaia)   │
//!  └──────────────┘  ack / timeout /  └──────────┘   state   └───────────┘
//!                    query response
//! ```

use super::host::HostChain;
use super::invariants::{check_all, UnbondingTracker};
use super::relayer::{answer_queries, relay_packets};
use lsc_ledger_store::BlockHeader;
use lsc_node_runtime::{BlockOutcome, NodeConfig, NodeRuntime, Tx};
use lsc_stakeibc::adapters::encode_address;
use lsc_stakeibc::keeper::must_get_host_zone;
use lsc_stakeibc::{
    Bank, ControlMsg, HostZone, HostZoneConfig, IcaAccountType, MsgLiquidStake, MsgRedeemStake, Params, SentPacket,
    UserMsg, ValidatorConfig,
};
use shared_types::{Coin, Int, NANOS_PER_SECOND};

pub const GAIA: &str = "gaia";
pub const ADMIN: &str = "stride1admin";
pub const HOST_DENOM: &str = "uatom";
pub const IBC_DENOM: &str = "ibc/uatom";
pub const ST_DENOM: &str = "stuatom";
pub const GENESIS_FUNDS: u128 = 10_000_000;

pub const HOUR_NANOS: u64 = 3_600 * NANOS_PER_SECOND;
pub const STRIDE_EPOCH_NANOS: u64 = 6 * HOUR_NANOS;
pub const DAY_NANOS: u64 = 24 * HOUR_NANOS;

const MAX_SETTLE_ROUNDS: usize = 12;

pub fn user(n: u8) -> String {
    encode_address("stride", &[n; 20]).expect("valid local address")
}

pub fn host_addr(n: u8) -> String {
    encode_address("cosmos", &[n; 20]).expect("valid host address")
}

pub fn valoper(n: u8) -> String {
    encode_address("cosmosvaloper", &[n; 20]).expect("valid validator address")
}

pub fn delegation_ica() -> String {
    host_addr(101)
}

pub fn withdrawal_ica() -> String {
    host_addr(102)
}

pub fn fee_ica() -> String {
    host_addr(103)
}

pub fn redemption_ica() -> String {
    host_addr(104)
}

pub fn gaia_config() -> HostZoneConfig {
    HostZoneConfig {
        chain_id: GAIA.to_string(),
        bech32_prefix: "cosmos".to_string(),
        connection_id: "connection-0".to_string(),
        transfer_channel_id: "channel-0".to_string(),
        host_denom: HOST_DENOM.to_string(),
        ibc_denom: IBC_DENOM.to_string(),
        unbonding_period_days: 1,
        max_messages_per_ica_tx: 32,
        bounds: None,
        lsm_liquid_stake_enabled: false,
        validators: [("a", 1, 50), ("b", 2, 30), ("c", 3, 20)]
            .into_iter()
            .map(|(name, n, weight)| ValidatorConfig {
                name: name.to_string(),
                address: valoper(n),
                weight,
            })
            .collect(),
    }
}

pub fn liquid_stake(staker: &str, amount: u128) -> Tx {
    Tx::User(UserMsg::LiquidStake(MsgLiquidStake {
        creator: staker.to_string(),
        amount: Int::new(amount),
        host_denom: HOST_DENOM.to_string(),
    }))
}

pub fn redeem_stake(redeemer: &str, amount: u128, receiver: &str) -> Tx {
    Tx::User(UserMsg::RedeemStake(MsgRedeemStake {
        creator: redeemer.to_string(),
        amount: Int::new(amount),
        host_zone_id: GAIA.to_string(),
        receiver: receiver.to_string(),
    }))
}

pub fn admin(msg: ControlMsg) -> Tx {
    Tx::Control {
        signer: ADMIN.to_string(),
        msg,
    }
}

pub struct TestNet {
    pub runtime: NodeRuntime,
    pub host: HostChain,
    tracker: UnbondingTracker,
}

impl TestNet {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Network with `gaia` registered and its four accounts open.
    pub fn with_params(mut params: Params) -> Self {
        if !params.admins.iter().any(|a| a == ADMIN) {
            params.admins.push(ADMIN.to_string());
        }
        let config = NodeConfig {
            genesis_balances: vec![
                (user(1), Coin::new(GENESIS_FUNDS, IBC_DENOM)),
                (user(2), Coin::new(GENESIS_FUNDS, IBC_DENOM)),
            ],
            params,
            ..NodeConfig::default()
        };
        let mut net = Self {
            runtime: NodeRuntime::new(config).expect("runtime mounts"),
            host: HostChain::new(HOST_DENOM),
            tracker: UnbondingTracker::default(),
        };

        let mut txs = vec![admin(ControlMsg::RegisterHostZone(gaia_config()))];
        for (n, account_type) in [
            IcaAccountType::Delegation,
            IcaAccountType::Withdrawal,
            IcaAccountType::Fee,
            IcaAccountType::Redemption,
        ]
        .into_iter()
        .enumerate()
        {
            let n = n as u8 + 1;
            txs.push(admin(ControlMsg::RegisterIcaAccount {
                chain_id: GAIA.to_string(),
                account_type,
                address: host_addr(100 + n),
                channel_id: format!("channel-{n}"),
            }));
        }
        let outcome = net.block(txs);
        assert!(outcome.results.iter().all(|r| r.is_applied()), "{:?}", outcome.results);
        net.host.set_reward_recipient(&delegation_ica(), &withdrawal_ica());
        net
    }

    pub fn now(&self) -> u64 {
        self.runtime.last_header().time_nanos
    }

    pub fn zone(&self) -> HostZone {
        must_get_host_zone(self.runtime.store(), GAIA).expect("gaia registered")
    }

    pub fn balance(&self, address: &str, denom: &str) -> Int {
        self.runtime
            .bank()
            .balance(self.runtime.store(), address, denom)
            .expect("bank readable")
    }

    pub fn st_balance(&self, address: &str) -> Int {
        self.balance(address, ST_DENOM)
    }

    pub fn pending(&self) -> Vec<SentPacket> {
        self.runtime.pending_packets().expect("transport readable")
    }

    pub fn live_queries(&self) -> usize {
        lsc_interchain_query::all_queries(self.runtime.store())
            .expect("queries readable")
            .iter()
            .filter(|query| !query.is_expired(self.runtime.next_header().time_nanos))
            .count()
    }

    /// Next block on the local clock.
    pub fn block(&mut self, txs: Vec<Tx>) -> BlockOutcome {
        let header = self.runtime.next_header();
        self.apply(header, txs)
    }

    /// Next block at `time_nanos`.
    pub fn block_at(&mut self, time_nanos: u64, txs: Vec<Tx>) -> BlockOutcome {
        let header = BlockHeader::new(self.runtime.last_header().height + 1, time_nanos);
        self.apply(header, txs)
    }

    fn apply(&mut self, header: BlockHeader, txs: Vec<Tx>) -> BlockOutcome {
        let outcome = self.runtime.apply_block(header, txs).expect("block commits");
        let keeper = self.runtime.keeper();
        if let Err(violation) = check_all(&keeper, self.runtime.store(), &mut self.tracker) {
            panic!("invariant violated at height {}: {violation}", header.height);
        }
        outcome
    }

    /// Empty block on the next stride epoch boundary.
    pub fn advance_to_next_stride(&mut self) -> BlockOutcome {
        let boundary = (self.now() / STRIDE_EPOCH_NANOS + 1) * STRIDE_EPOCH_NANOS;
        self.block_at(boundary, Vec::new())
    }

    /// Crosses stride boundaries one at a time, settling after each,
    /// until the clock reaches `time_nanos`.
    pub fn run_until(&mut self, time_nanos: u64) {
        while (self.now() / STRIDE_EPOCH_NANOS + 1) * STRIDE_EPOCH_NANOS <= time_nanos {
            self.advance_to_next_stride();
            self.settle();
        }
    }

    /// One relay round. Returns the number of relayed transactions.
    pub fn relay(&mut self) -> usize {
        self.relay_with_timeouts(|_| false)
    }

    /// One relay round in which packets matching `timed_out` time out
    /// instead of reaching the host.
    pub fn relay_with_timeouts(&mut self, timed_out: impl Fn(&SentPacket) -> bool) -> usize {
        let now = self.runtime.next_header().time_nanos;
        let (expired, delivered): (Vec<_>, Vec<_>) = self.pending().into_iter().partition(|sent| timed_out(sent));
        let mut txs: Vec<Tx> = expired
            .iter()
            .map(|sent| Tx::Timeout { packet: sent.id() })
            .collect();
        txs.extend(relay_packets(&mut self.host, delivered, now));
        txs.extend(answer_queries(&self.host, self.runtime.store(), now));
        if txs.is_empty() {
            return 0;
        }
        let count = txs.len();
        self.block(txs);
        count
    }

    /// Relays until no packet or live query is left. Returns the rounds run.
    pub fn settle(&mut self) -> usize {
        let mut rounds = 0;
        while rounds < MAX_SETTLE_ROUNDS && self.relay() > 0 {
            rounds += 1;
        }
        assert!(rounds < MAX_SETTLE_ROUNDS, "relaying did not quiesce");
        rounds
    }

    /// Stakes and runs the transfer and delegation ticks to completion.
    pub fn stake_and_delegate(&mut self, staker: &str, amount: u128) {
        let outcome = self.block(vec![liquid_stake(staker, amount)]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        for _ in 0..2 {
            self.advance_to_next_stride();
            self.settle();
        }
    }
}

impl Default for TestNet {
    fn default() -> Self {
        Self::new()
    }
}
