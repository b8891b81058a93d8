//! Ledger records: faucet registries, claim records and the per-claimer
//! sub-records used to chain cooldown checks.

use crate::address::{derive_claim_address, derive_claimant_address, derive_faucet_address, Address};
use crate::errors::LedgerError;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Maximum faucet name length in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Per-operator faucet registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaucetRegistry {
    pub address: Address,
    pub operator: Identity,
    pub name: String,
    pub total_claims: u64,
    pub created_at: i64,
}

impl FaucetRegistry {
    pub fn new(operator: Identity, name: String, created_at: i64) -> Result<Self, LedgerError> {
        Self::validate_name(&name)?;
        Ok(Self {
            address: derive_faucet_address(&operator),
            operator,
            name,
            total_claims: 0,
            created_at,
        })
    }

    /// Byte length, not char count: a 32-char name of multi-byte chars is rejected.
    pub fn validate_name(name: &str) -> Result<(), LedgerError> {
        if name.len() > MAX_NAME_LEN {
            return Err(LedgerError::NameTooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        Ok(())
    }
}

/// One granted claim. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimRecord {
    pub claimer: Identity,
    pub faucet_id: Address,
    pub amount: u64,
    pub timestamp: i64,
    /// Faucet-wide counter value at creation.
    pub index: u64,
    /// The claimer's own claim number under this faucet.
    pub sequence: u64,
    /// The claimer's previous record under the same faucet.
    pub previous: Option<Address>,
}

impl ClaimRecord {
    pub fn address(&self) -> Address {
        derive_claim_address(&self.claimer, &self.faucet_id, self.index)
    }
}

/// Cooldown chain head for one (faucet, claimer) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimantState {
    pub claimer: Identity,
    pub faucet_id: Address,
    pub claim_count: u64,
    pub last_claim_at: i64,
    pub last_record: Address,
}

impl ClaimantState {
    /// Derived address of this chain head.
    pub fn address(&self) -> Address {
        derive_claimant_address(&self.claimer, &self.faucet_id)
    }
}

/// Cross-faucet activity summary for a claimer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimerProfile {
    pub claimer: Identity,
    pub last_claim_timestamp: i64,
    pub last_faucet: Address,
    pub total_claims_across_faucets: u64,
}
