//! Claim orchestration: admit, pay, then record.
//!
//! [`ClaimAuthority`] owns the operator key and drives one claim through the
//! ledger's two-phase API:
//!
//! 1. `reserve_claim` checks the cooldown and holds the claimer's slot
//! 2. the transfer runs, bounded by `transfer_timeout`
//! 3. `commit_claim` on success, `rollback_claim` on a definite failure
//!
//! A claim is therefore never recorded without a confirmed transfer, and a
//! failed transfer never burns the claimer's cooldown.
//!
//! # Unknown outcomes
//!
//! If the transfer times out, the funds may or may not have moved. The
//! reservation is kept (not committed, not rolled back) until its TTL
//! expires, which rejects blind retries in the meantime. Callers should
//! re-query the claim history before retrying.

use crate::address::Address;
use crate::errors::LedgerError;
use crate::identity::{Identity, OperatorKey};
use crate::ledger::{ClaimLedger, ClaimScope};
use crate::receipt::ClaimReceipt;
use crate::state::{ClaimRecord, FaucetRegistry};
use crate::transfer::{TransferError, TransferExecutor};
use std::sync::Arc;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ClaimError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("transfer outcome unknown after {timeout_ms}ms")]
    TransferTimedOut { timeout_ms: u64 },

    #[error("transfer {transfer_signature} confirmed but the claim was not recorded: {source}")]
    CommitFailed {
        transfer_signature: String,
        source: LedgerError,
    },
}

impl ClaimError {
    /// Machine-readable code string.
    pub fn code_str(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.code_str(),
            Self::Transfer(_) => "TRANSFER_FAILED",
            Self::TransferTimedOut { .. } => "TRANSFER_UNKNOWN",
            Self::CommitFailed { .. } => "COMMIT_FAILED",
        }
    }

    /// True for the "wait and try again" cooldown/in-progress rejections.
    pub fn is_cooldown(&self) -> bool {
        matches!(
            self,
            Self::Ledger(LedgerError::ClaimTooRecent { .. } | LedgerError::ClaimInProgress { .. })
        )
    }
}

/// Fixed claim policy of one authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityConfig {
    pub claim_amount: u64,
    pub cooldown_seconds: u64,
    pub transfer_timeout: Duration,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            // 0.1 of a 10^9-subunit token
            claim_amount: 100_000_000,
            cooldown_seconds: 86_400,
            transfer_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ClaimAuthority {
    ledger: Arc<ClaimLedger>,
    key: OperatorKey,
    executor: Arc<dyn TransferExecutor>,
    config: AuthorityConfig,
}

impl ClaimAuthority {
    pub fn new(
        ledger: Arc<ClaimLedger>,
        key: OperatorKey,
        executor: Arc<dyn TransferExecutor>,
        config: AuthorityConfig,
    ) -> Self {
        Self {
            ledger,
            key,
            executor,
            config,
        }
    }

    pub fn operator(&self) -> Identity {
        self.key.identity()
    }

    pub fn ledger(&self) -> &Arc<ClaimLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Register this operator's faucet.
    pub fn register(&self, name: &str) -> Result<Address, LedgerError> {
        self.ledger.register_faucet(self.operator(), name)
    }

    /// Register unless already registered; returns the faucet address either way.
    pub fn ensure_registered(&self, name: &str) -> Result<Address, LedgerError> {
        match self.register(name) {
            Ok(address) => Ok(address),
            Err(LedgerError::FaucetAlreadyExists { .. }) => {
                tracing::info!("Faucet already registered for {}", self.operator());
                Ok(self.stats()?.address)
            }
            Err(e) => Err(e),
        }
    }

    pub fn stats(&self) -> Result<FaucetRegistry, LedgerError> {
        self.ledger.get_faucet_stats(&self.operator())
    }

    pub fn history(&self, claimer: &Identity) -> Result<Vec<ClaimRecord>, LedgerError> {
        self.ledger
            .get_claim_history(claimer, ClaimScope::Faucet(self.operator()))
    }

    /// Claim the configured amount.
    pub async fn request_default_claim(&self, claimer: &Identity) -> Result<ClaimReceipt, ClaimError> {
        self.request_claim(claimer, self.config.claim_amount).await
    }

    /// Admit, pay and record one claim.
    #[tracing::instrument(skip(self), fields(operator = %self.operator()))]
    pub async fn request_claim(
        &self,
        claimer: &Identity,
        amount: u64,
    ) -> Result<ClaimReceipt, ClaimError> {
        let operator = self.operator();
        let reservation =
            self.ledger
                .reserve_claim(&operator, claimer, amount, self.config.cooldown_seconds)?;

        let outcome = tokio::time::timeout(
            self.config.transfer_timeout,
            self.executor.transfer(&operator, claimer, amount),
        )
        .await;

        let confirmation = match outcome {
            Ok(Ok(confirmation)) => confirmation,
            Ok(Err(e)) => {
                tracing::warn!("Transfer to {} failed, releasing claim: {}", claimer, e);
                self.ledger.rollback_claim(&reservation)?;
                return Err(ClaimError::Transfer(e));
            }
            Err(_) => {
                let timeout_ms = saturating_millis(self.config.transfer_timeout);
                tracing::error!(
                    "Transfer to {} timed out after {}ms; holding reservation {}",
                    claimer,
                    timeout_ms,
                    reservation.token_id
                );
                return Err(ClaimError::TransferTimedOut { timeout_ms });
            }
        };

        let record_id = match self.ledger.commit_claim(&reservation) {
            Ok(address) => address,
            Err(source) => {
                tracing::error!(
                    "Transfer {} to {} confirmed but commit failed: {}",
                    confirmation.signature,
                    claimer,
                    source
                );
                return Err(ClaimError::CommitFailed {
                    transfer_signature: confirmation.signature,
                    source,
                });
            }
        };

        let record = self
            .ledger
            .get_record(&record_id)?
            .ok_or_else(|| LedgerError::Internal(format!("record {} missing after commit", record_id)))?;
        let receipt = ClaimReceipt::issue(&self.key, &record, confirmation.signature)?;

        tracing::info!(
            "Claim {} paid: {} units to {}",
            receipt.record_id,
            amount,
            claimer
        );
        Ok(receipt)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for ClaimAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimAuthority")
            .field("operator", &self.operator())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::transfer::SimulatedTransfer;

    const AMOUNT: u64 = 4_000_000;

    fn setup(treasury: SimulatedTransfer) -> (ClaimAuthority, Arc<SimulatedTransfer>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let ledger = Arc::new(ClaimLedger::with_clock(clock.clone()));
        let key = OperatorKey::generate();
        let treasury = Arc::new(treasury);
        treasury.fund(&key.identity(), 100 * AMOUNT);

        let authority = ClaimAuthority::new(
            ledger,
            key,
            treasury.clone(),
            AuthorityConfig {
                claim_amount: AMOUNT,
                cooldown_seconds: 60,
                transfer_timeout: Duration::from_millis(50),
            },
        );
        authority.register("TEST FAUCET").unwrap();
        (authority, treasury, clock)
    }

    #[tokio::test]
    async fn test_claim_pays_and_records() {
        let (authority, treasury, _) = setup(SimulatedTransfer::new());
        let claimer = Identity::random();

        let receipt = authority.request_default_claim(&claimer).await.unwrap();
        assert!(receipt.verify().unwrap());
        assert_eq!(receipt.amount, AMOUNT);
        assert_eq!(receipt.operator, authority.operator());
        assert_eq!(treasury.balance_of(&claimer), AMOUNT);
        assert_eq!(authority.stats().unwrap().total_claims, 1);
        assert_eq!(authority.history(&claimer).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_rejects_without_paying() {
        let (authority, treasury, clock) = setup(SimulatedTransfer::new());
        let claimer = Identity::random();

        authority.request_default_claim(&claimer).await.unwrap();
        clock.advance(30);
        let err = authority.request_default_claim(&claimer).await.unwrap_err();
        assert!(err.is_cooldown());
        assert_eq!(err.code_str(), "COOLDOWN_ACTIVE");
        assert_eq!(treasury.transfer_count(), 1);

        clock.advance(31);
        assert!(authority.request_default_claim(&claimer).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_trace() {
        let (authority, treasury, _) = setup(SimulatedTransfer::new());
        let claimer = Identity::random();
        treasury.set_offline(true);

        let err = authority.request_default_claim(&claimer).await.unwrap_err();
        assert!(matches!(err, ClaimError::Transfer(TransferError::Transport(_))));
        assert_eq!(authority.stats().unwrap().total_claims, 0);
        assert_eq!(authority.ledger().pending_reservations().unwrap(), 0);

        treasury.set_offline(false);
        assert!(authority.request_default_claim(&claimer).await.is_ok());
    }

    #[tokio::test]
    async fn test_timeout_holds_reservation() {
        let (authority, _, clock) =
            setup(SimulatedTransfer::new().with_latency(Duration::from_millis(500)));
        let claimer = Identity::random();

        let err = authority.request_default_claim(&claimer).await.unwrap_err();
        assert!(matches!(err, ClaimError::TransferTimedOut { timeout_ms: 50 }));
        assert_eq!(authority.stats().unwrap().total_claims, 0);

        let retry = authority.request_default_claim(&claimer).await.unwrap_err();
        assert!(matches!(
            retry,
            ClaimError::Ledger(LedgerError::ClaimInProgress { .. })
        ));

        clock.advance(authority.ledger().config().reservation_ttl_secs as i64);
        // The stale reservation is replaced; the slow treasury times out again.
        let after_ttl = authority.request_default_claim(&claimer).await.unwrap_err();
        assert!(matches!(after_ttl, ClaimError::TransferTimedOut { .. }));
        assert_eq!(authority.ledger().pending_reservations().unwrap(), 1);
    }

    #[test]
    fn test_timeout_millis_saturates() {
        assert_eq!(saturating_millis(Duration::from_millis(50)), 50);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_ensure_registered_is_idempotent() {
        let (authority, _, _) = setup(SimulatedTransfer::new());
        let first = authority.stats().unwrap().address;
        assert_eq!(authority.ensure_registered("TEST FAUCET").unwrap(), first);
        assert!(matches!(
            authority.register("again"),
            Err(LedgerError::FaucetAlreadyExists { .. })
        ));
    }
}
