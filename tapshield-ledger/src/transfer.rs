//! Value transfer seam.
//!
//! The ledger never moves funds itself. [`ClaimAuthority`](crate::ClaimAuthority)
//! calls a [`TransferExecutor`] between admitting a claim and committing it.
//! [`SimulatedTransfer`] is an in-memory treasury for demos and tests.

use crate::identity::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("transfer rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Proof that a transfer went through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfirmation {
    pub signature: String,
    pub confirmed_at: i64,
}

/// Moves `amount` smallest units from `from` to `to`.
///
/// Implementations must only return `Ok` once the transfer is final.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(
        &self,
        from: &Identity,
        to: &Identity,
        amount: u64,
    ) -> Result<TransferConfirmation, TransferError>;
}

#[derive(Serialize)]
struct TransferPayload<'a> {
    from: &'a [u8],
    to: &'a [u8],
    amount: u64,
    sequence: u64,
}

/// In-memory treasury with optional latency and outage simulation.
#[derive(Debug, Default)]
pub struct SimulatedTransfer {
    balances: Mutex<HashMap<Identity, u64>>,
    sequence: AtomicU64,
    offline: AtomicBool,
    latency: Option<Duration>,
}

impl SimulatedTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transfer sleeps for `latency` before settling.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn fund(&self, account: &Identity, amount: u64) {
        let mut balances = self.balances.lock().unwrap_or_else(|e| e.into_inner());
        let balance = balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &Identity) -> u64 {
        self.balances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// While offline every transfer fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn transfer_count(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferExecutor for SimulatedTransfer {
    async fn transfer(
        &self,
        from: &Identity,
        to: &Identity,
        amount: u64,
    ) -> Result<TransferConfirmation, TransferError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransferError::Transport("treasury offline".into()));
        }

        let sequence = {
            let mut balances = self.balances.lock().unwrap_or_else(|e| e.into_inner());
            let available = balances.get(from).copied().unwrap_or(0);
            if available < amount {
                return Err(TransferError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
            balances.insert(*from, available - amount);
            let credited = balances.entry(*to).or_insert(0);
            *credited = credited.saturating_add(amount);
            self.sequence.fetch_add(1, Ordering::SeqCst) + 1
        };

        let payload = TransferPayload {
            from: from.as_bytes(),
            to: to.as_bytes(),
            amount,
            sequence,
        };
        let bytes = postcard::to_allocvec(&payload)
            .map_err(|e| TransferError::Rejected(format!("encoding failed: {}", e)))?;

        Ok(TransferConfirmation {
            signature: hex::encode(Sha256::digest(&bytes)),
            confirmed_at: chrono::Utc::now().timestamp(),
        })
    }
}
