//! # Randomized Pipeline Runs
//!
//! Random interleavings of user actions, epoch ticks, relaying and host
//! rewards. The harness checks the end-of-block invariants after every
//! block; once relaying quiesces, the host's view of the delegations must
//! match the coordinator's.

#[cfg(test)]
mod tests {
    use crate::harness::network::*;
    use lsc_node_runtime::Tx;
    use lsc_records::keeper::redemption::all_user_redemption_records;
    use lsc_stakeibc::{MsgClaimUndelegatedTokens, UserMsg};
    use proptest::prelude::*;
    use shared_types::Int;

    #[derive(Clone, Debug)]
    enum Action {
        Stake { staker: u8, amount: u128 },
        Redeem { redeemer: u8, pct: u128 },
        ClaimAll,
        Tick,
        Relay,
        Settle,
        Reward { validator: u8, amount: u128 },
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            3 => (1u8..=2, 1u128..50_000).prop_map(|(staker, amount)| Action::Stake { staker, amount }),
            2 => (1u8..=2, 1u128..=100).prop_map(|(redeemer, pct)| Action::Redeem { redeemer, pct }),
            1 => Just(Action::ClaimAll),
            3 => Just(Action::Tick),
            2 => Just(Action::Relay),
            2 => Just(Action::Settle),
            1 => (1u8..=3, 1u128..500).prop_map(|(validator, amount)| Action::Reward { validator, amount }),
        ]
    }

    fn claims(net: &TestNet) -> Vec<Tx> {
        all_user_redemption_records(net.runtime.store())
            .unwrap()
            .into_iter()
            .filter(|record| !record.claim_is_pending)
            .map(|record| {
                Tx::User(UserMsg::ClaimUndelegatedTokens(MsgClaimUndelegatedTokens {
                    creator: record.sender.clone(),
                    host_zone_id: record.host_zone_id,
                    epoch: record.epoch_number,
                    sender: record.sender,
                }))
            })
            .collect()
    }

    fn apply(net: &mut TestNet, action: Action) {
        match action {
            Action::Stake { staker, amount } => {
                net.block(vec![liquid_stake(&user(staker), amount)]);
            }
            Action::Redeem { redeemer, pct } => {
                let held = net.st_balance(&user(redeemer)).u128();
                let amount = held * pct / 100;
                if amount > 0 {
                    net.block(vec![redeem_stake(&user(redeemer), amount, &host_addr(7))]);
                }
            }
            Action::ClaimAll => {
                let txs = claims(net);
                net.block(txs);
            }
            Action::Tick => {
                net.advance_to_next_stride();
            }
            Action::Relay => {
                net.relay();
            }
            Action::Settle => {
                net.settle();
            }
            Action::Reward { validator, amount } => net.host.accrue_reward(&valoper(validator), amount),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_random_runs_keep_both_sides_consistent(actions in prop::collection::vec(arb_action(), 1..30)) {
            let mut net = TestNet::new();
            for action in actions {
                apply(&mut net, action);
            }
            net.settle();
            prop_assert!(net.pending().is_empty());

            let zone = net.zone();
            let mut on_host = Int::zero();
            for validator in &zone.validators {
                let held = net.host.delegation(&delegation_ica(), &validator.address);
                prop_assert_eq!(held, validator.delegation);
                on_host += held;
            }
            prop_assert_eq!(on_host, zone.total_delegations);
        }
    }
}
