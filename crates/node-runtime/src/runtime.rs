//! # Block Executor
//!
//! ```text
//!  execute_block(header, txs)
//!    │  begin block layer
//!    ├─ epochs::begin_block ──► StakeIbcKeeper hooks (stride / day stages)
//!    ├─ for tx in txs: branch { deliver(tx) }   // rejected tx rolls back alone
//!    ├─ invariant sweep (halts unbalanced zones)
//!    │  commit
//!    ├─ refresh read snapshot
//!    └─ publish committed events ──► shared bus, metrics
//! ```
//!
//! The store is the only mutable state. Readers that must not wait for block
//! execution go through [`SnapshotReader`].

use crate::config::NodeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::migrations::MigrationRegistry;
use crate::tx::{Tx, TxOutcome, TxResult};
use lsc_epochs::EpochTick;
use lsc_ledger_store::{prefix, BlockContext, BlockHeader, KvRead, Snapshot, Store};
use lsc_stakeibc::{Bank, Bech32Accounts, PacketTransport, SentPacket, StakeIbcKeeper, StakeIbcResult, StoreBank};
use lsc_telemetry::{
    record_event, time_histogram, BLOCKS_EXECUTED, BLOCK_EXECUTION_DURATION, BLOCK_HEIGHT, INVARIANT_VIOLATIONS,
    TRANSACTIONS,
};
use parking_lot::RwLock;
use shared_bus::{EventPublisher, InMemoryEventBus};
use shared_types::StakeEvent;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

fn last_header_key() -> Vec<u8> {
    prefix::LAST_BLOCK_HEADER.as_bytes().to_vec()
}

/// Everything one committed block produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockOutcome {
    pub header: BlockHeader,
    pub ticks: Vec<EpochTick>,
    pub results: Vec<TxResult>,
    /// Zones halted by the end-of-block sweep.
    pub halted: Vec<String>,
    pub events: Vec<StakeEvent>,
}

/// Read handle over the last committed state.
#[derive(Clone)]
pub struct SnapshotReader {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotReader {
    pub fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        f(&self.inner.read())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }
}

pub struct NodeRuntime {
    config: NodeConfig,
    store: Store,
    keeper: Arc<StakeIbcKeeper>,
    bank: Arc<StoreBank>,
    transport: Arc<PacketTransport>,
    bus: Arc<InMemoryEventBus>,
    snapshot: Arc<RwLock<Snapshot>>,
    last_header: BlockHeader,
}

impl NodeRuntime {
    /// Runtime over a fresh in-memory store with no migrations.
    pub fn new(config: NodeConfig) -> RuntimeResult<Self> {
        Self::mount(config, Store::in_memory(), &MigrationRegistry::new())
    }

    /// Mounts `store`: writes genesis if the store is empty, then applies
    /// every pending migration.
    pub fn mount(config: NodeConfig, mut store: Store, migrations: &MigrationRegistry) -> RuntimeResult<Self> {
        config.validate()?;

        let bank = Arc::new(StoreBank::new());
        let transport = Arc::new(PacketTransport::new());
        let keeper = Arc::new(StakeIbcKeeper::new(
            config.params.clone(),
            bank.clone(),
            Arc::new(Bech32Accounts::new(config.local_prefix.clone())),
            transport.clone(),
        ));

        let last_header = match store.get_value::<BlockHeader>(&last_header_key())? {
            Some(header) => header,
            None => Self::init_genesis(&config, bank.as_ref(), &mut store)?,
        };

        store.begin();
        let mut ctx = BlockContext::new(&mut store, last_header);
        let mounted = migrations.apply_pending(&mut ctx);
        let events = ctx.into_events();
        match mounted {
            Ok(applied) => {
                store.commit()?;
                if !applied.is_empty() {
                    info!(count = applied.len(), "Store migrations applied at mount");
                }
            }
            Err(err) => {
                store.rollback()?;
                return Err(err);
            }
        }
        events.iter().for_each(record_event);

        let snapshot = Arc::new(RwLock::new(store.snapshot()?));
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        info!(
            height = last_header.height,
            time_nanos = last_header.time_nanos,
            "Node runtime mounted"
        );

        Ok(Self {
            config,
            store,
            keeper,
            bank,
            transport,
            bus,
            snapshot,
            last_header,
        })
    }

    fn init_genesis(config: &NodeConfig, bank: &StoreBank, store: &mut Store) -> RuntimeResult<BlockHeader> {
        let header = BlockHeader::new(0, config.genesis_time_nanos);
        store.begin();
        match write_genesis(config, bank, store, header) {
            Ok(()) => store.commit()?,
            Err(err) => {
                store.rollback()?;
                return Err(err);
            }
        }
        info!(
            genesis_time_nanos = config.genesis_time_nanos,
            balances = config.genesis_balances.len(),
            "Genesis written"
        );
        Ok(header)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn keeper(&self) -> Arc<StakeIbcKeeper> {
        Arc::clone(&self.keeper)
    }

    pub fn bank(&self) -> &StoreBank {
        self.bank.as_ref()
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// Committed state, read from the executing thread.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read handle for other threads.
    pub fn snapshot_reader(&self) -> SnapshotReader {
        SnapshotReader {
            inner: Arc::clone(&self.snapshot),
        }
    }

    pub fn last_header(&self) -> BlockHeader {
        self.last_header
    }

    /// Header of the next block on the local clock.
    pub fn next_header(&self) -> BlockHeader {
        BlockHeader::new(
            self.last_header.height + 1,
            self.last_header.time_nanos + self.config.block_time_nanos(),
        )
    }

    /// Outbound packets awaiting an ack or timeout.
    pub fn pending_packets(&self) -> RuntimeResult<Vec<SentPacket>> {
        Ok(self.transport.pending_packets(&self.store)?)
    }

    /// Executes and commits one block, then publishes its events.
    pub async fn execute_block(&mut self, header: BlockHeader, txs: Vec<Tx>) -> RuntimeResult<BlockOutcome> {
        let outcome = self.apply_block(header, txs)?;
        let published = self
            .bus
            .publish_block(header.height, header.time_nanos, outcome.events.clone())
            .await;
        debug!(height = header.height, published, "Block events published");
        Ok(outcome)
    }

    /// Executes and commits one block without touching the bus.
    pub fn apply_block(&mut self, header: BlockHeader, txs: Vec<Tx>) -> RuntimeResult<BlockOutcome> {
        self.check_order(header)?;
        let _timer = time_histogram!(BLOCK_EXECUTION_DURATION);
        let keeper = Arc::clone(&self.keeper);

        self.store.begin();
        let outcome = match run_block(&keeper, &mut self.store, header, txs) {
            Ok(outcome) => {
                self.store.commit()?;
                outcome
            }
            Err(err) => {
                self.store.rollback()?;
                error!(height = header.height, error = %err, "Block aborted");
                return Err(err);
            }
        };
        self.last_header = header;
        *self.snapshot.write() = self.store.snapshot()?;

        BLOCKS_EXECUTED.inc();
        BLOCK_HEIGHT.set(header.height as f64);
        INVARIANT_VIOLATIONS.inc_by(outcome.halted.len() as f64);
        for result in &outcome.results {
            TRANSACTIONS.with_label_values(&[result.kind.as_str(), result.label()]).inc();
        }
        outcome.events.iter().for_each(record_event);

        info!(
            height = header.height,
            txs = outcome.results.len(),
            ticks = outcome.ticks.len(),
            events = outcome.events.len(),
            "Block committed"
        );
        Ok(outcome)
    }

    fn check_order(&self, header: BlockHeader) -> RuntimeResult<()> {
        let expected = self.last_header.height + 1;
        if header.height != expected || header.time_nanos < self.last_header.time_nanos {
            return Err(RuntimeError::BlockOutOfOrder {
                expected,
                got: header.height,
                min_time: self.last_header.time_nanos,
            });
        }
        Ok(())
    }
}

fn write_genesis(config: &NodeConfig, bank: &StoreBank, store: &mut Store, header: BlockHeader) -> RuntimeResult<()> {
    for info in config.genesis_epochs() {
        lsc_epochs::add_epoch_info(store, info)?;
    }
    for (address, coin) in &config.genesis_balances {
        bank.mint(store, address, coin)?;
    }
    store.set_value(last_header_key(), &header)?;
    Ok(())
}

fn run_block(
    keeper: &StakeIbcKeeper,
    store: &mut Store,
    header: BlockHeader,
    txs: Vec<Tx>,
) -> RuntimeResult<BlockOutcome> {
    let mut ctx = BlockContext::new(store, header);
    let ticks = lsc_epochs::begin_block(&mut ctx, keeper)?;

    let mut results = Vec::with_capacity(txs.len());
    for (index, tx) in txs.into_iter().enumerate() {
        let kind = tx.kind();
        let outcome = match ctx.branch(|ctx| deliver(keeper, ctx, tx)) {
            Ok(()) => TxOutcome::Applied,
            Err(err) => {
                warn!(height = header.height, index, kind, error = %err, "Transaction rejected");
                TxOutcome::Rejected(err.to_string())
            }
        };
        results.push(TxResult {
            index,
            kind: kind.to_string(),
            outcome,
        });
    }

    let halted = keeper.check_delegation_totals(&mut ctx)?;
    ctx.store_mut().set_value(last_header_key(), &header)?;

    Ok(BlockOutcome {
        header,
        ticks,
        results,
        halted,
        events: ctx.into_events(),
    })
}

fn deliver(keeper: &StakeIbcKeeper, ctx: &mut BlockContext<'_>, tx: Tx) -> StakeIbcResult<()> {
    match tx {
        Tx::User(msg) => keeper.handle_user(ctx, &msg),
        Tx::Control { signer, msg } => keeper.handle_control(ctx, &signer, msg),
        Tx::Ack { packet, ack } => keeper.on_acknowledgement(ctx, &packet, &ack),
        Tx::Timeout { packet } => keeper.on_timeout(ctx, &packet),
        Tx::QueryResponse { query_id, result } => keeper.on_query_response(ctx, &query_id, &result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::applied_at;
    use lsc_epochs::STRIDE_EPOCH;
    use lsc_ledger_store::MemoryBackend;
    use lsc_stakeibc::adapters::encode_address;
    use lsc_stakeibc::keeper::get_host_zone;
    use lsc_stakeibc::{ControlMsg, HostZoneConfig, MsgLiquidStake, UserMsg, ValidatorConfig};
    use shared_bus::{EventFilter, EventSubscriber, EventTopic};
    use shared_types::{Int, NANOS_PER_SECOND};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADMIN: &str = "stride1admin";
    const SIX_HOURS: u64 = 6 * 3_600 * NANOS_PER_SECOND;

    fn config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.params.admins = vec![ADMIN.to_string()];
        config
    }

    fn register_gaia() -> Tx {
        Tx::Control {
            signer: ADMIN.to_string(),
            msg: ControlMsg::RegisterHostZone(HostZoneConfig {
                chain_id: "gaia".to_string(),
                bech32_prefix: "cosmos".to_string(),
                connection_id: "connection-0".to_string(),
                transfer_channel_id: "channel-0".to_string(),
                host_denom: "uatom".to_string(),
                ibc_denom: "ibc/uatom".to_string(),
                unbonding_period_days: 1,
                max_messages_per_ica_tx: 32,
                bounds: None,
                lsm_liquid_stake_enabled: false,
                validators: vec![ValidatorConfig {
                    name: "a".to_string(),
                    address: encode_address("cosmosvaloper", &[1; 20]).unwrap(),
                    weight: 1,
                }],
            }),
        }
    }

    #[test]
    fn test_genesis_and_epoch_catch_up() {
        let mut runtime = NodeRuntime::new(config()).unwrap();
        assert_eq!(runtime.last_header(), BlockHeader::new(0, 0));

        let first = runtime.apply_block(BlockHeader::new(1, 0), vec![]).unwrap();
        assert!(first.ticks.is_empty());

        let second = runtime.apply_block(BlockHeader::new(2, SIX_HOURS), vec![]).unwrap();
        assert_eq!(second.ticks.iter().filter(|t| t.is(STRIDE_EPOCH)).count(), 1);
        // The hour stream catches up one tick per elapsed hour.
        assert_eq!(second.ticks.iter().filter(|t| t.is("hour")).count(), 6);
        assert_eq!(runtime.last_header().height, 2);
    }

    #[test]
    fn test_out_of_order_block_rejected() {
        let mut runtime = NodeRuntime::new(config()).unwrap();
        let err = runtime.apply_block(BlockHeader::new(3, 0), vec![]).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::BlockOutOfOrder {
                expected: 1,
                got: 3,
                ..
            }
        ));
        assert_eq!(runtime.last_header().height, 0);
    }

    #[test]
    fn test_rejected_tx_rolls_back_alone() {
        let mut runtime = NodeRuntime::new(config()).unwrap();
        let txs = vec![
            register_gaia(),
            Tx::User(UserMsg::LiquidStake(MsgLiquidStake {
                creator: "stride1user".to_string(),
                amount: Int::new(10),
                host_denom: "uosmo".to_string(),
            })),
            Tx::Control {
                signer: "stride1mallory".to_string(),
                msg: ControlMsg::ToggleHalt {
                    chain_id: "gaia".to_string(),
                },
            },
        ];
        let outcome = runtime.apply_block(BlockHeader::new(1, 0), txs).unwrap();

        let applied: Vec<bool> = outcome.results.iter().map(TxResult::is_applied).collect();
        assert_eq!(applied, vec![true, false, false]);
        assert_eq!(outcome.results[2].kind, "toggle_halt");
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e, StakeEvent::HostZoneRegistered { .. })));
        assert!(!outcome.events.iter().any(|e| matches!(e, StakeEvent::HostZoneHalted { .. })));

        let zone = get_host_zone(runtime.store(), "gaia").unwrap().unwrap();
        assert!(!zone.halted);
    }

    #[test]
    fn test_snapshot_reader_sees_committed_state() {
        let mut runtime = NodeRuntime::new(config()).unwrap();
        let reader = runtime.snapshot_reader();
        assert!(reader.read(|snap| get_host_zone(snap, "gaia").unwrap()).is_none());

        runtime.apply_block(BlockHeader::new(1, 0), vec![register_gaia()]).unwrap();
        assert!(reader.read(|snap| get_host_zone(snap, "gaia").unwrap()).is_some());
    }

    #[test]
    fn test_migrations_run_once_across_mounts() {
        let backend = Arc::new(MemoryBackend::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut registry = MigrationRegistry::new();
        registry
            .register("seed-admin-zone", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let mut runtime = NodeRuntime::mount(config(), Store::new(backend.clone()), &registry).unwrap();
        runtime.apply_block(BlockHeader::new(1, 0), vec![]).unwrap();
        assert_eq!(applied_at(runtime.store(), "seed-admin-zone").unwrap(), Some(0));
        drop(runtime);

        let remounted = NodeRuntime::mount(config(), Store::new(backend), &registry).unwrap();
        assert_eq!(remounted.last_header().height, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_genesis_balances_are_minted() {
        let mut config = config();
        config.genesis_balances = vec![("stride1user".to_string(), shared_types::Coin::new(500u128, "ibc/uatom"))];
        let runtime = NodeRuntime::new(config).unwrap();
        assert_eq!(
            runtime.bank().balance(runtime.store(), "stride1user", "ibc/uatom").unwrap(),
            Int::new(500)
        );
    }

    #[tokio::test]
    async fn test_committed_events_reach_subscribers() {
        let mut runtime = NodeRuntime::new(config()).unwrap();
        let mut sub = runtime
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Control]).for_chain("gaia"));

        runtime
            .execute_block(BlockHeader::new(1, 0), vec![register_gaia()])
            .await
            .unwrap();

        let first = sub.try_recv().unwrap().unwrap();
        assert_eq!(first.height, 1);
        assert_eq!(first.topic(), EventTopic::Control);
    }
}
