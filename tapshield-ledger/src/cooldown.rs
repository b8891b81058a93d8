//! Cooldown evaluation.
//!
//! A claimer may claim again from the same faucet once
//! `now >= last_claim_at + cooldown_seconds`. A clock that moved backwards
//! counts as "not yet elapsed", never as elapsed.

use serde::{Deserialize, Serialize};

/// Read-only eligibility verdict for one (faucet, claimer) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub last_claim_at: Option<i64>,
    pub next_eligible_at: Option<i64>,
    pub retry_after_secs: u64,
}

impl Eligibility {
    /// Evaluate a cooldown window against the claimer's previous claim.
    pub fn evaluate(last_claim_at: Option<i64>, now: i64, cooldown_seconds: u64) -> Self {
        let Some(last) = last_claim_at else {
            return Self {
                eligible: true,
                last_claim_at: None,
                next_eligible_at: None,
                retry_after_secs: 0,
            };
        };

        let cooldown = i64::try_from(cooldown_seconds).unwrap_or(i64::MAX);
        let next_eligible_at = last.saturating_add(cooldown);
        let eligible = now >= next_eligible_at;
        let retry_after_secs = if eligible {
            0
        } else {
            u64::try_from(next_eligible_at.saturating_sub(now)).unwrap_or(u64::MAX)
        };

        Self {
            eligible,
            last_claim_at: Some(last),
            next_eligible_at: Some(next_eligible_at),
            retry_after_secs,
        }
    }
}
