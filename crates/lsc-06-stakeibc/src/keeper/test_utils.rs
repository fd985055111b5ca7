//! Keeper fixture: one registered `gaia` zone with open accounts and the
//! stride epoch counting from genesis.

use super::StakeIbcKeeper;
use crate::adapters::{encode_address, Bech32Accounts, PacketTransport, SentPacket, StoreBank};
use crate::config::Params;
use crate::domain::{ControlMsg, HostZone, HostZoneConfig, IcaAccountType, MsgResponse, PacketPayload, ValidatorConfig};
use crate::keeper::host_zone::{must_get_host_zone, set_host_zone};
use crate::ports::Bank;
use lsc_epochs::EpochInfo;
use lsc_icacallbacks::Acknowledgement;
use lsc_ledger_store::{BlockContext, BlockHeader, Store};
use shared_types::{Coin, Int, StakeEvent, NANOS_PER_SECOND};
use std::sync::Arc;

pub const GAIA: &str = "gaia";
pub const ADMIN: &str = "stride1admin";

pub struct Harness {
    pub store: Store,
    pub bank: Arc<StoreBank>,
    pub transport: Arc<PacketTransport>,
    pub header: BlockHeader,
    keeper: Arc<StakeIbcKeeper>,
}

impl Harness {
    pub fn new() -> Self {
        let params = Params {
            admins: vec![ADMIN.to_string()],
            ..Params::default()
        };
        Self::with_params(params)
    }

    pub fn with_params(params: Params) -> Self {
        let bank = Arc::new(StoreBank::new());
        let transport = Arc::new(PacketTransport::new());
        let keeper = Arc::new(StakeIbcKeeper::new(
            params,
            bank.clone(),
            Arc::new(Bech32Accounts::new("stride")),
            transport.clone(),
        ));
        let mut harness = Self {
            store: Store::in_memory(),
            bank,
            transport,
            header: BlockHeader::new(1, 0),
            keeper,
        };

        for info in EpochInfo::genesis_epochs(0) {
            lsc_epochs::add_epoch_info(&mut harness.store, info).unwrap();
        }
        let keeper = harness.keeper();
        let mut ctx = harness.ctx();
        lsc_epochs::begin_block(&mut ctx, keeper.as_ref()).unwrap();
        keeper
            .handle_control(&mut ctx, ADMIN, ControlMsg::RegisterHostZone(Self::gaia_config()))
            .unwrap();
        for (n, account) in [
            IcaAccountType::Delegation,
            IcaAccountType::Withdrawal,
            IcaAccountType::Fee,
            IcaAccountType::Redemption,
        ]
        .into_iter()
        .enumerate()
        {
            let n = n as u8 + 1;
            keeper
                .handle_control(
                    &mut ctx,
                    ADMIN,
                    ControlMsg::RegisterIcaAccount {
                        chain_id: GAIA.to_string(),
                        account_type: account,
                        address: Self::host_addr(100 + n),
                        channel_id: format!("channel-{n}"),
                    },
                )
                .unwrap();
        }
        harness
    }

    pub fn gaia_config() -> HostZoneConfig {
        HostZoneConfig {
            chain_id: GAIA.to_string(),
            bech32_prefix: "cosmos".to_string(),
            connection_id: "connection-0".to_string(),
            transfer_channel_id: "channel-0".to_string(),
            host_denom: "uatom".to_string(),
            ibc_denom: "ibc/uatom".to_string(),
            unbonding_period_days: 1,
            max_messages_per_ica_tx: 32,
            bounds: None,
            lsm_liquid_stake_enabled: false,
            validators: vec![
                ValidatorConfig {
                    name: "a".to_string(),
                    address: Self::valoper(1),
                    weight: 50,
                },
                ValidatorConfig {
                    name: "b".to_string(),
                    address: Self::valoper(2),
                    weight: 30,
                },
                ValidatorConfig {
                    name: "c".to_string(),
                    address: Self::valoper(3),
                    weight: 20,
                },
            ],
        }
    }

    pub fn keeper(&self) -> Arc<StakeIbcKeeper> {
        self.keeper.clone()
    }

    pub fn ctx(&mut self) -> BlockContext<'_> {
        BlockContext::new(&mut self.store, self.header)
    }

    pub fn user(n: u8) -> String {
        encode_address("stride", &[n; 20]).unwrap()
    }

    pub fn host_addr(n: u8) -> String {
        encode_address("cosmos", &[n; 20]).unwrap()
    }

    pub fn valoper(n: u8) -> String {
        encode_address("cosmosvaloper", &[n; 20]).unwrap()
    }

    pub fn zone(&self) -> HostZone {
        must_get_host_zone(&self.store, GAIA).unwrap()
    }

    pub fn update_zone(&mut self, f: impl FnOnce(&mut HostZone)) {
        let mut zone = self.zone();
        f(&mut zone);
        set_host_zone(&mut self.store, &zone).unwrap();
    }

    /// Sets confirmed delegations per validator and the zone total.
    pub fn set_delegations(&mut self, amounts: &[u128]) {
        self.update_zone(|zone| {
            let mut total = Int::zero();
            for (validator, amount) in zone.validators.iter_mut().zip(amounts) {
                validator.delegation = Int::new(*amount);
                total += Int::new(*amount);
            }
            zone.total_delegations = total;
        });
    }

    pub fn fund(&mut self, address: &str, amount: u128, denom: &str) {
        self.bank
            .mint(&mut self.store, address, &Coin::new(amount, denom))
            .unwrap();
    }

    pub fn balance(&self, address: &str, denom: &str) -> u128 {
        self.bank.balance(&self.store, address, denom).unwrap().u128()
    }

    pub fn pending(&self) -> Vec<SentPacket> {
        self.transport.pending_packets(&self.store).unwrap()
    }

    /// Pending packets whose ICA tx contains a message matching `pred`.
    pub fn pending_where(&self, pred: impl Fn(&PacketPayload) -> bool) -> Vec<SentPacket> {
        self.pending()
            .into_iter()
            .filter(|sent| pred(&sent.packet.payload))
            .collect()
    }

    /// Moves the block clock forward and runs the epoch begin-blocker.
    pub fn advance(&mut self, nanos: u64) -> Vec<StakeEvent> {
        self.header = BlockHeader::new(self.header.height + 1, self.header.time_nanos + nanos);
        let keeper = self.keeper();
        let mut ctx = self.ctx();
        lsc_epochs::begin_block(&mut ctx, keeper.as_ref()).unwrap();
        ctx.into_events()
    }

    pub fn advance_secs(&mut self, secs: u64) -> Vec<StakeEvent> {
        self.advance(secs * NANOS_PER_SECOND)
    }

    pub fn ack_success(&mut self, sent: &SentPacket, responses: Vec<MsgResponse>) -> Vec<StakeEvent> {
        let bytes = Acknowledgement::Result(responses.iter().map(|r| r.encode().unwrap()).collect()).encode();
        self.ack_bytes(sent, &bytes)
    }

    /// Success ack with one empty response per message.
    pub fn ack_empty(&mut self, sent: &SentPacket) -> Vec<StakeEvent> {
        let count = match &sent.packet.payload {
            PacketPayload::IcaTx(msgs) => msgs.len(),
            PacketPayload::Transfer(_) => 1,
        };
        self.ack_success(sent, vec![MsgResponse::Empty; count])
    }

    pub fn ack_error(&mut self, sent: &SentPacket) -> Vec<StakeEvent> {
        let bytes = Acknowledgement::Error("host rejected".to_string()).encode();
        self.ack_bytes(sent, &bytes)
    }

    pub fn ack_bytes(&mut self, sent: &SentPacket, bytes: &[u8]) -> Vec<StakeEvent> {
        let keeper = self.keeper();
        let mut ctx = self.ctx();
        keeper.on_acknowledgement(&mut ctx, &sent.id(), bytes).unwrap();
        ctx.into_events()
    }

    pub fn timeout(&mut self, sent: &SentPacket) -> Vec<StakeEvent> {
        let keeper = self.keeper();
        let mut ctx = self.ctx();
        keeper.on_timeout(&mut ctx, &sent.id()).unwrap();
        ctx.into_events()
    }
}
