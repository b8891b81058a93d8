//! Concurrency stress tests for ClaimLedger
//!
//! These tests verify that admission and recording are atomic under contention

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;
    use tapshield_ledger::{ClaimLedger, ClaimScope, Identity, LedgerError};
    use tokio::task::JoinSet;

    fn registered() -> (Arc<ClaimLedger>, Identity) {
        let ledger = Arc::new(ClaimLedger::in_memory());
        let operator = Identity::random();
        ledger.register_faucet(operator, "stress").unwrap();
        (ledger, operator)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_claims_single_winner() {
        let (ledger, operator) = registered();
        let claimer = Identity::random();
        let mut tasks = JoinSet::new();

        for _ in 0..100 {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move { ledger.record_claim(&operator, &claimer, 10, 3600) });
        }

        let mut success_count = 0;
        let mut throttled_count = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => success_count += 1,
                Err(LedgerError::ClaimTooRecent { .. }) => throttled_count += 1,
                Err(e) => panic!("Unexpected error: {}", e),
            }
        }

        assert_eq!(success_count, 1, "Exactly one claim should be recorded");
        assert_eq!(throttled_count, 99);
        assert_eq!(ledger.get_faucet_stats(&operator).unwrap().total_claims, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_claimers_all_succeed() {
        let (ledger, operator) = registered();
        let mut tasks = JoinSet::new();

        for _ in 0..100 {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move {
                let claimer = Identity::random();
                ledger
                    .record_claim(&operator, &claimer, 10, 3600)
                    .map(|address| (claimer, address))
            });
        }

        let mut indices = Vec::new();
        while let Some(result) = tasks.join_next().await {
            let (claimer, address) = result.unwrap().expect("distinct claimers never collide");
            let record = ledger.get_record(&address).unwrap().unwrap();
            assert_eq!(record.claimer, claimer);
            indices.push(record.index);
        }

        indices.sort_unstable();
        assert_eq!(indices, (0..100).collect::<Vec<u64>>());
        assert_eq!(ledger.get_faucet_stats(&operator).unwrap().total_claims, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reservations_race_with_direct_claims() {
        let (ledger, operator) = registered();
        let claimer = Identity::random();
        let mut tasks = JoinSet::new();

        for i in 0..50 {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move {
                if i % 2 == 0 {
                    ledger.record_claim(&operator, &claimer, 10, 3600).map(|_| ())
                } else {
                    let token = ledger.reserve_claim(&operator, &claimer, 10, 3600)?;
                    tokio::task::yield_now().await;
                    ledger.commit_claim(&token).map(|_| ())
                }
            });
        }

        let mut success_count = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap().is_ok() {
                success_count += 1;
            }
        }

        assert_eq!(success_count, 1);
        assert_eq!(
            ledger
                .get_claim_history(&claimer, ClaimScope::AllFaucets)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(ledger.pending_reservations().unwrap(), 0);
    }

    #[test]
    fn test_os_threads_share_ledger() {
        let (ledger, operator) = registered();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        ledger
                            .record_claim(&operator, &Identity::random(), 1, 60)
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.get_faucet_stats(&operator).unwrap().total_claims, 200);
    }
}
