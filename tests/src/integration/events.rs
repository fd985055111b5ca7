//! Committed events reaching bus subscribers through the async block path.

#[cfg(test)]
mod tests {
    use crate::harness::network::*;
    use shared_bus::{EventFilter, EventSubscriber, EventTopic};
    use shared_types::{Int, StakeEvent};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_user_topic_subscriber_sees_liquid_stake() {
        let mut net = TestNet::new();
        let mut sub = net
            .runtime
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::User]));

        let header = net.runtime.next_header();
        net.runtime
            .execute_block(header, vec![liquid_stake(&user(1), 1_000)])
            .await
            .unwrap();

        let committed = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(committed.height, header.height);
        assert_eq!(committed.time_nanos, header.time_nanos);
        assert!(matches!(
            committed.event,
            StakeEvent::LiquidStake { ref chain_id, st_amount, .. }
                if chain_id == GAIA && st_amount == Int::new(1_000)
        ));
    }

    #[tokio::test]
    async fn test_rejected_tx_publishes_nothing() {
        let mut net = TestNet::new();
        let mut sub = net
            .runtime
            .bus()
            .subscribe(EventFilter::all().for_chain(GAIA));

        let header = net.runtime.next_header();
        let outcome = net
            .runtime
            .execute_block(header, vec![liquid_stake(&user(9), 1_000)])
            .await
            .unwrap();

        assert!(!outcome.results[0].is_applied());
        assert!(outcome.events.is_empty());
        assert!(matches!(sub.try_recv(), Ok(None)));
    }
}
