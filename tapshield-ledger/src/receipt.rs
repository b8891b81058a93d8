//! Signed claim receipts
//!
//! A receipt binds a committed claim record to the transfer that paid it,
//! signed by the faucet operator's Ed25519 key.
//!
//! ## Security Model
//! - Canonical bytes via postcard, hashed with SHA-256
//! - Domain-separated (`TAPSHIELD_RECEIPT_V1`)
//! - The record id is re-derived from the receipt's own seeds on verify, so a
//!   receipt cannot point at a record address it does not describe

use crate::address::{derive_claim_address, Address};
use crate::errors::LedgerError;
use crate::identity::{verify_signature, Identity, OperatorKey};
use crate::state::ClaimRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const RECEIPT_DOMAIN: &[u8] = b"TAPSHIELD_RECEIPT_V1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub record_id: Address,
    pub faucet_id: Address,
    pub operator: Identity,
    pub claimer: Identity,
    pub amount: u64,
    pub index: u64,
    pub timestamp: i64,
    pub transfer_signature: String,
    /// Hex-encoded Ed25519 signature by `operator`.
    pub signature: String,
}

#[derive(Serialize)]
struct ReceiptPayload<'a> {
    domain: &'static [u8],
    record_id: &'a [u8],
    faucet_id: &'a [u8],
    operator: &'a [u8],
    claimer: &'a [u8],
    amount: u64,
    index: u64,
    timestamp: i64,
    transfer_signature: &'a str,
}

impl ClaimReceipt {
    /// Build and sign a receipt for a committed record.
    pub fn issue(
        key: &OperatorKey,
        record: &ClaimRecord,
        transfer_signature: String,
    ) -> Result<Self, LedgerError> {
        let mut receipt = Self {
            record_id: record.address(),
            faucet_id: record.faucet_id,
            operator: key.identity(),
            claimer: record.claimer,
            amount: record.amount,
            index: record.index,
            timestamp: record.timestamp,
            transfer_signature,
            signature: String::new(),
        };
        let digest = receipt.digest()?;
        receipt.signature = hex::encode(key.sign(&digest));
        Ok(receipt)
    }

    fn digest(&self) -> Result<[u8; 32], LedgerError> {
        let payload = ReceiptPayload {
            domain: RECEIPT_DOMAIN,
            record_id: self.record_id.as_bytes(),
            faucet_id: self.faucet_id.as_bytes(),
            operator: self.operator.as_bytes(),
            claimer: self.claimer.as_bytes(),
            amount: self.amount,
            index: self.index,
            timestamp: self.timestamp,
            transfer_signature: &self.transfer_signature,
        };
        let canonical = postcard::to_allocvec(&payload)?;
        let hash = Sha256::digest(&canonical);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hash);
        Ok(out)
    }

    /// Check the record id and the operator signature.
    ///
    /// `Ok(false)` for a tampered or mis-signed receipt; `Err` for malformed
    /// signature encoding.
    pub fn verify(&self) -> Result<bool, LedgerError> {
        if derive_claim_address(&self.claimer, &self.faucet_id, self.index) != self.record_id {
            return Ok(false);
        }

        let raw = hex::decode(&self.signature)
            .map_err(|e| LedgerError::Crypto(format!("signature is not hex: {}", e)))?;
        let sig: [u8; 64] = raw
            .try_into()
            .map_err(|_| LedgerError::Crypto("Invalid signature length".into()))?;

        verify_signature(&self.operator, &self.digest()?, &sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::derive_faucet_address;

    fn sample() -> (OperatorKey, ClaimReceipt) {
        let key = OperatorKey::generate();
        let record = ClaimRecord {
            claimer: Identity::random(),
            faucet_id: derive_faucet_address(&key.identity()),
            amount: 4_000_000,
            timestamp: 1_700_000_000,
            index: 0,
            sequence: 0,
            previous: None,
        };
        let receipt = ClaimReceipt::issue(&key, &record, "ab".repeat(32)).unwrap();
        (key, receipt)
    }

    #[test]
    fn test_issue_and_verify() {
        let (key, receipt) = sample();
        assert_eq!(receipt.operator, key.identity());
        assert_eq!(receipt.signature.len(), 128);
        assert!(receipt.verify().unwrap());
    }

    #[test]
    fn test_tampered_amount_fails() {
        let (_, mut receipt) = sample();
        receipt.amount += 1;
        assert!(!receipt.verify().unwrap());
    }

    #[test]
    fn test_mismatched_record_id_fails() {
        let (_, mut receipt) = sample();
        receipt.index = 7;
        assert!(!receipt.verify().unwrap());
    }

    #[test]
    fn test_foreign_signer_fails() {
        let (_, mut receipt) = sample();
        receipt.operator = OperatorKey::generate().identity();
        assert!(!receipt.verify().unwrap());
    }

    #[test]
    fn test_garbage_signature_is_error() {
        let (_, mut receipt) = sample();
        receipt.signature = "nothex".into();
        assert!(receipt.verify().is_err());
    }
}
