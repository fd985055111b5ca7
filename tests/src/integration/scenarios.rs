//! # Pipeline Scenarios
//!
//! Each test drives the full runtime against the simulated host, epoch by
//! epoch, and checks records, delegations and balances on both sides.
//! Every block also passes the end-of-block invariants of the harness.
//!
//! Clock: blocks every 5s, stride ticks every 6h, day ticks every 24h.
//! The first stride tick lands at 6h and opens stride epoch 2.

#[cfg(test)]
mod tests {
    use crate::harness::network::*;
    use lsc_node_runtime::{Tx, TxOutcome};
    use lsc_records::keeper::deposit::deposit_records_for_zone;
    use lsc_records::keeper::redemption::get_user_redemption_record;
    use lsc_records::keeper::unbonding::get_host_zone_unbonding;
    use lsc_records::{user_redemption_record_id, DepositRecordStatus, HostZoneUnbondingStatus};
    use lsc_stakeibc::domain::queries::VALIDATOR_EXCHANGE_RATE;
    use lsc_stakeibc::{
        halt_matches_redemption_rate, Bank, ControlMsg, MsgClaimUndelegatedTokens, Params, PacketPayload, RedemptionBounds,
        RemoteMsg, SentPacket, UserMsg,
    };
    use shared_types::{Dec, Int, StakeEvent};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn current_epoch(net: &TestNet) -> u64 {
        net.runtime
            .keeper()
            .current_stride_epoch(net.runtime.store())
            .unwrap()
    }

    fn delegations(net: &TestNet) -> Vec<u128> {
        net.zone().validators.iter().map(|v| v.delegation.u128()).collect()
    }

    fn deposit_statuses(net: &TestNet) -> Vec<DepositRecordStatus> {
        deposit_records_for_zone(net.runtime.store(), GAIA)
            .unwrap()
            .into_iter()
            .map(|record| record.status)
            .collect()
    }

    fn unbonding_status(net: &TestNet, epoch: u64) -> HostZoneUnbondingStatus {
        get_host_zone_unbonding(net.runtime.store(), epoch, GAIA).unwrap().status
    }

    fn claim(claimer: &str, epoch: u64) -> Tx {
        Tx::User(UserMsg::ClaimUndelegatedTokens(MsgClaimUndelegatedTokens {
            creator: claimer.to_string(),
            host_zone_id: GAIA.to_string(),
            epoch,
            sender: claimer.to_string(),
        }))
    }

    /// Rewards are claimed on the first tick and counted on the second.
    fn accrue_and_count(net: &mut TestNet, amount: u128) {
        net.host.accrue_reward(&valoper(1), amount);
        net.advance_to_next_stride();
        net.settle();
        net.advance_to_next_stride();
    }

    fn is_undelegation(sent: &SentPacket) -> bool {
        matches!(&sent.packet.payload, PacketPayload::IcaTx(msgs)
            if msgs.iter().any(|msg| matches!(msg, RemoteMsg::Undelegate { .. })))
    }

    /// Stakes 1000, delegates it, then redeems `amount` in the following
    /// stride epoch. Returns that epoch.
    fn staked_then_redeemed(net: &mut TestNet, amount: u128) -> u64 {
        net.stake_and_delegate(&user(1), 1_000);
        let epoch = current_epoch(net);
        let outcome = net.block(vec![redeem_stake(&user(1), amount, &host_addr(7))]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        epoch
    }

    // =========================================================================
    // STAKE TO DELEGATION
    // =========================================================================

    #[test]
    fn test_liquid_stake_reaches_weighted_delegations() {
        let mut net = TestNet::new();
        let outcome = net.block(vec![liquid_stake(&user(1), 1_000)]);
        assert!(outcome.results[0].is_applied());
        assert_eq!(net.st_balance(&user(1)), Int::new(1_000));
        assert_eq!(net.balance(&user(1), IBC_DENOM), Int::new(GENESIS_FUNDS - 1_000));
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::TransferQueue]);

        net.advance_to_next_stride();
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::TransferInProgress]);
        net.settle();
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::DelegationQueue]);
        assert_eq!(net.host.native_balance(&delegation_ica()), Int::new(1_000));

        net.advance_to_next_stride();
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::DelegationInProgress]);
        net.relay();

        assert!(deposit_statuses(&net).is_empty());
        assert_eq!(delegations(&net), vec![500, 300, 200]);
        let zone = net.zone();
        assert_eq!(zone.total_delegations, Int::new(1_000));
        assert_eq!(zone.redemption_rate, Dec::one());
        assert_eq!(net.host.delegation(&delegation_ica(), &valoper(1)), Int::new(500));
        assert_eq!(net.host.delegation(&delegation_ica(), &valoper(3)), Int::new(200));
    }

    // =========================================================================
    // REDEMPTION TO CLAIM
    // =========================================================================

    #[test]
    fn test_redemption_unbonds_exits_and_pays_out() {
        let mut net = TestNet::new();
        let epoch = staked_then_redeemed(&mut net, 400);
        let zone = net.zone();
        assert_eq!(net.st_balance(&user(1)), Int::new(600));
        assert_eq!(net.st_balance(&zone.redemption_module_address), Int::new(400));
        let unbonding = get_host_zone_unbonding(net.runtime.store(), epoch, GAIA).unwrap();
        assert_eq!(unbonding.st_token_amount, Int::new(400));
        assert_eq!(unbonding.status, HostZoneUnbondingStatus::UnbondingQueue);

        net.advance_to_next_stride();
        assert_eq!(unbonding_status(&net, epoch), HostZoneUnbondingStatus::UnbondingInProgress);
        net.settle();

        let unbonding = get_host_zone_unbonding(net.runtime.store(), epoch, GAIA).unwrap();
        assert_eq!(unbonding.status, HostZoneUnbondingStatus::ExitTransferQueue);
        assert_eq!(unbonding.native_token_amount, Int::new(400));
        assert_eq!(net.zone().total_delegations, Int::new(600));
        assert_eq!(delegations(&net), vec![300, 180, 120]);
        assert!(net.st_balance(&zone.redemption_module_address).is_zero());

        // the unbonding matures a day after the undelegation, the next day
        // tick moves it to the redemption account
        net.run_until(2 * DAY_NANOS);
        assert_eq!(unbonding_status(&net, epoch), HostZoneUnbondingStatus::Claimable);
        assert_eq!(net.host.native_balance(&redemption_ica()), Int::new(400));

        let id = user_redemption_record_id(epoch, GAIA, &user(1));
        let record = get_user_redemption_record(net.runtime.store(), &id).unwrap().unwrap();
        assert_eq!(record.native_token_amount, Int::new(400));
        assert!(!record.claim_is_pending);

        let outcome = net.block(vec![claim(&user(1), epoch)]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        net.settle();

        assert_eq!(net.host.native_balance(&host_addr(7)), Int::new(400));
        assert!(net.host.native_balance(&redemption_ica()).is_zero());
        assert!(get_user_redemption_record(net.runtime.store(), &id).unwrap().is_none());
    }

    #[test]
    fn test_full_round_trip_returns_everything() {
        let mut net = TestNet::new();
        let epoch = staked_then_redeemed(&mut net, 1_000);
        net.advance_to_next_stride();
        net.settle();
        assert!(net.zone().total_delegations.is_zero());
        assert_eq!(delegations(&net), vec![0, 0, 0]);

        net.run_until(2 * DAY_NANOS);
        net.block(vec![claim(&user(1), epoch)]);
        net.settle();

        assert_eq!(net.host.native_balance(&host_addr(7)), Int::new(1_000));
        assert!(net.st_balance(&user(1)).is_zero());
        assert!(net
            .runtime
            .bank()
            .supply(net.runtime.store(), ST_DENOM)
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_claim_before_exit_transfer_is_rejected() {
        let mut net = TestNet::new();
        let epoch = staked_then_redeemed(&mut net, 400);
        let outcome = net.block(vec![claim(&user(1), epoch)]);
        assert!(matches!(outcome.results[0].outcome, TxOutcome::Rejected(_)));
    }

    #[test]
    fn test_early_claim_does_not_skip_its_exit_transfer() {
        let mut net = TestNet::new();
        let first = staked_then_redeemed(&mut net, 400);
        net.advance_to_next_stride();
        net.settle();
        net.run_until(2 * DAY_NANOS);
        assert_eq!(unbonding_status(&net, first), HostZoneUnbondingStatus::Claimable);
        assert_eq!(net.host.native_balance(&redemption_ica()), Int::new(400));

        let second = current_epoch(&net);
        let outcome = net.block(vec![redeem_stake(&user(1), 100, &host_addr(7))]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        net.advance_to_next_stride();
        net.settle();
        assert_eq!(unbonding_status(&net, second), HostZoneUnbondingStatus::ExitTransferQueue);

        // paid out of the first epoch's tokens, ahead of its own transfer
        let outcome = net.block(vec![claim(&user(1), second)]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        net.settle();
        assert_eq!(net.host.native_balance(&host_addr(7)), Int::new(100));
        assert_eq!(unbonding_status(&net, second), HostZoneUnbondingStatus::ExitTransferQueue);

        net.run_until(4 * DAY_NANOS);
        assert!(net.host.native_balance(&delegation_ica()).is_zero());
        assert_eq!(net.host.native_balance(&redemption_ica()), Int::new(400));

        let outcome = net.block(vec![claim(&user(1), first)]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        net.settle();
        assert_eq!(net.host.native_balance(&host_addr(7)), Int::new(500));
        assert!(net.host.native_balance(&redemption_ica()).is_zero());
        let id = user_redemption_record_id(first, GAIA, &user(1));
        assert!(get_user_redemption_record(net.runtime.store(), &id).unwrap().is_none());
    }

    // =========================================================================
    // SLASHING
    // =========================================================================

    #[test]
    fn test_slash_is_detected_through_exchange_rate_query() {
        let mut net = TestNet::new();
        net.block(vec![liquid_stake(&user(1), 1_000_000)]);
        net.advance_to_next_stride();
        net.settle();
        net.advance_to_next_stride();
        net.relay();

        let zone = net.zone();
        assert_eq!(zone.total_delegations, Int::new(1_000_000));
        assert!(zone
            .validators
            .iter()
            .all(|v| v.slash_query_checkpoint == Int::new(10_000)));
        let rate_queries = lsc_interchain_query::all_queries(net.runtime.store())
            .unwrap()
            .into_iter()
            .filter(|query| query.callback_id == VALIDATOR_EXCHANGE_RATE)
            .count();
        assert_eq!(rate_queries, 3);

        net.host.set_rate(&valoper(1), Dec::percent(99));
        net.settle();

        let zone = net.zone();
        let slashed = zone.validator(&valoper(1)).unwrap();
        assert_eq!(slashed.delegation, Int::new(495_000));
        assert_eq!(slashed.shares_to_tokens_rate, Dec::percent(99));
        assert!(slashed.slash_query_progress_tracker.is_zero());
        assert!(!slashed.slash_query_in_progress);
        assert_eq!(zone.total_delegations, Int::new(995_000));
        assert!(zone
            .validators
            .iter()
            .all(|v| v.slash_query_checkpoint == Int::new(9_950)));
        assert_eq!(net.host.delegation(&delegation_ica(), &valoper(1)), Int::new(495_000));
    }

    // =========================================================================
    // REDEMPTION RATE SAFETY
    // =========================================================================

    #[test]
    fn test_rewards_move_rate_through_freeze_to_halt() {
        let mut net = TestNet::with_params(Params {
            stride_commission_bps: 0,
            ..Params::default()
        });
        let outcome = net.block(vec![admin(ControlMsg::UpdateRedemptionBounds {
            chain_id: GAIA.to_string(),
            bounds: RedemptionBounds {
                min_outer: Dec::percent(95),
                min_inner: Dec::percent(98),
                max_inner: Dec::percent(110),
                max_outer: Dec::percent(125),
            },
        })]);
        assert!(outcome.results[0].is_applied(), "{:?}", outcome.results);
        net.stake_and_delegate(&user(1), 1_000);

        accrue_and_count(&mut net, 50);
        let zone = net.zone();
        assert_eq!(zone.redemption_rate, Dec::percent(105));
        assert!(!zone.redemption_rate_frozen);
        net.settle();

        accrue_and_count(&mut net, 100);
        let zone = net.zone();
        assert_eq!(zone.redemption_rate, Dec::percent(115));
        assert!(zone.redemption_rate_frozen);
        assert!(!zone.halted);
        let outcome = net.block(vec![liquid_stake(&user(2), 100)]);
        assert!(matches!(outcome.results[0].outcome, TxOutcome::Rejected(_)));
        net.settle();

        accrue_and_count(&mut net, 150);
        let zone = net.zone();
        assert_eq!(zone.redemption_rate, Dec::percent(130));
        assert!(zone.halted);
        assert!(halt_matches_redemption_rate(&zone));
        let outcome = net.block(vec![liquid_stake(&user(2), 100)]);
        assert!(matches!(outcome.results[0].outcome, TxOutcome::Rejected(_)));
    }

    #[test]
    fn test_commission_goes_to_fee_account() {
        let mut net = TestNet::new();
        net.stake_and_delegate(&user(1), 1_000);
        net.host.accrue_reward(&valoper(2), 100);
        net.advance_to_next_stride();
        net.settle();

        assert_eq!(net.host.native_balance(&fee_ica()), Int::new(10));
        assert!(net.host.native_balance(&withdrawal_ica()).is_zero());
        assert!(net.zone().reward_balance.is_zero());
        let reinvested: Vec<u128> = deposit_records_for_zone(net.runtime.store(), GAIA)
            .unwrap()
            .into_iter()
            .map(|record| record.amount.u128())
            .collect();
        assert_eq!(reinvested, vec![90]);
    }

    // =========================================================================
    // FAILURE PATHS
    // =========================================================================

    #[test]
    fn test_undelegation_timeout_reverts_then_retries() {
        let mut net = TestNet::new();
        let epoch = staked_then_redeemed(&mut net, 400);
        net.advance_to_next_stride();
        assert!(net.zone().validators.iter().all(|v| v.delegation_changes_in_progress == 1));

        net.relay_with_timeouts(is_undelegation);

        let zone = net.zone();
        assert!(zone.validators.iter().all(|v| v.delegation_changes_in_progress == 0));
        assert_eq!(delegations(&net), vec![500, 300, 200]);
        let unbonding = get_host_zone_unbonding(net.runtime.store(), epoch, GAIA).unwrap();
        assert_eq!(unbonding.status, HostZoneUnbondingStatus::UnbondingQueue);
        assert_eq!(unbonding.native_tokens_to_unbond, Int::new(400));
        assert_eq!(net.st_balance(&zone.redemption_module_address), Int::new(400));
        net.settle();

        net.advance_to_next_stride();
        assert_eq!(unbonding_status(&net, epoch), HostZoneUnbondingStatus::UnbondingInProgress);
        assert!(net.pending().iter().any(is_undelegation));
        net.settle();
        assert_eq!(unbonding_status(&net, epoch), HostZoneUnbondingStatus::ExitTransferQueue);
        assert_eq!(net.zone().total_delegations, Int::new(600));
    }

    #[test]
    fn test_duplicate_acknowledgement_is_ignored() {
        let mut net = TestNet::new();
        net.block(vec![liquid_stake(&user(1), 1_000)]);
        net.advance_to_next_stride();
        let now = net.runtime.next_header().time_nanos;
        let pending = net.pending();
        let txs = crate::harness::relayer::relay_packets(&mut net.host, pending, now);
        net.block(txs.clone());
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::DelegationQueue]);

        let outcome = net.block(txs);
        assert!(outcome.results.iter().all(|r| r.is_applied()));
        assert!(outcome
            .events
            .iter()
            .any(|event| matches!(event, StakeEvent::CallbackMissing { .. })));
        assert_eq!(deposit_statuses(&net), vec![DepositRecordStatus::DelegationQueue]);
    }

    // =========================================================================
    // REDEMPTION RECORDS
    // =========================================================================

    #[test]
    fn test_redemptions_in_one_epoch_merge() {
        let mut net = TestNet::new();
        net.stake_and_delegate(&user(1), 1_000);
        let epoch = current_epoch(&net);
        let outcome = net.block(vec![
            redeem_stake(&user(1), 100, &host_addr(7)),
            redeem_stake(&user(1), 150, &host_addr(7)),
        ]);
        assert!(outcome.results.iter().all(|r| r.is_applied()));

        let id = user_redemption_record_id(epoch, GAIA, &user(1));
        let record = get_user_redemption_record(net.runtime.store(), &id).unwrap().unwrap();
        assert_eq!(record.st_token_amount, Int::new(250));
        let unbonding = get_host_zone_unbonding(net.runtime.store(), epoch, GAIA).unwrap();
        assert_eq!(unbonding.st_token_amount, Int::new(250));
        assert_eq!(unbonding.user_redemption_records, vec![id]);
    }

    #[test]
    fn test_redeem_to_foreign_prefix_is_rejected() {
        let mut net = TestNet::new();
        net.stake_and_delegate(&user(1), 1_000);
        let outcome = net.block(vec![redeem_stake(&user(1), 100, &user(9))]);
        assert!(matches!(outcome.results[0].outcome, TxOutcome::Rejected(_)));
        assert_eq!(net.st_balance(&user(1)), Int::new(1_000));
    }
}
