//! Property-based tests for tapshield-ledger
//!
//! These tests use proptest to verify invariants across a wide range of inputs.

#[cfg(test)]
mod address_properties {
    use proptest::prelude::*;
    use tapshield_ledger::{derive_claim_address, derive_faucet_address, Address, Identity};

    proptest! {
        /// Derivation is a pure function of its seeds
        #[test]
        fn claim_address_deterministic(claimer in any::<[u8; 32]>(), faucet in any::<[u8; 32]>(), index in any::<u64>()) {
            let claimer = Identity::from_bytes(claimer);
            let faucet = Address::from_bytes(faucet);
            prop_assert_eq!(
                derive_claim_address(&claimer, &faucet, index),
                derive_claim_address(&claimer, &faucet, index)
            );
        }

        /// Different indices never share an address
        #[test]
        fn claim_address_distinct_per_index(claimer in any::<[u8; 32]>(), a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            let claimer = Identity::from_bytes(claimer);
            let faucet = derive_faucet_address(&Identity::from_bytes([7u8; 32]));
            prop_assert_ne!(
                derive_claim_address(&claimer, &faucet, a),
                derive_claim_address(&claimer, &faucet, b)
            );
        }

        /// Different operators never share a faucet address
        #[test]
        fn faucet_address_distinct(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            prop_assume!(a != b);
            prop_assert_ne!(
                derive_faucet_address(&Identity::from_bytes(a)),
                derive_faucet_address(&Identity::from_bytes(b))
            );
        }

        /// Hex rendering parses back to the same address
        #[test]
        fn address_hex_parses(bytes in any::<[u8; 32]>()) {
            let address = Address::from_bytes(bytes);
            let parsed: Address = address.to_string().parse().unwrap();
            prop_assert_eq!(parsed, address);
        }
    }
}

#[cfg(test)]
mod ledger_properties {
    use proptest::prelude::*;
    use std::sync::Arc;
    use tapshield_ledger::{ClaimLedger, ClaimScope, Eligibility, Identity, ManualClock};

    proptest! {
        /// The counter always equals the number of accepted claims, and
        /// accepted claims for one claimer are at least a cooldown apart
        #[test]
        fn counter_and_spacing_hold(
            steps in prop::collection::vec((0usize..4, 0i64..120), 1..60),
            cooldown in 1u64..100
        ) {
            let clock = Arc::new(ManualClock::new(1_000_000));
            let ledger = ClaimLedger::with_clock(clock.clone());
            let operator = Identity::random();
            ledger.register_faucet(operator, "prop").unwrap();
            let claimers: Vec<Identity> = (0..4).map(|_| Identity::random()).collect();

            let mut accepted = 0u64;
            for (who, advance) in steps {
                clock.advance(advance);
                if ledger.record_claim(&operator, &claimers[who], 1, cooldown).is_ok() {
                    accepted += 1;
                }
            }

            prop_assert_eq!(ledger.get_faucet_stats(&operator).unwrap().total_claims, accepted);
            for claimer in &claimers {
                let history = ledger.get_claim_history(claimer, ClaimScope::Faucet(operator)).unwrap();
                for pair in history.windows(2) {
                    prop_assert!(pair[1].timestamp - pair[0].timestamp >= cooldown as i64);
                }
            }
        }

        /// Retry hint always lands exactly on the eligibility boundary
        #[test]
        fn retry_after_reaches_boundary(last in 0i64..1_000_000, elapsed in 0i64..10_000, cooldown in 1u64..10_000) {
            let now = last + elapsed;
            let verdict = Eligibility::evaluate(Some(last), now, cooldown);
            if verdict.eligible {
                prop_assert!(elapsed >= cooldown as i64);
                prop_assert_eq!(verdict.retry_after_secs, 0);
            } else {
                prop_assert_eq!(now + verdict.retry_after_secs as i64, last + cooldown as i64);
            }
        }
    }
}
