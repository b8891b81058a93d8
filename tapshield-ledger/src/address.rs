//! Deterministic address derivation
//!
//! Every faucet, claim record and claimant sub-record lives at an address that
//! is a pure function of its seeds, so any party can recompute where a record
//! must be and check that it exists without a central index.
//!
//! ## Encoding
//! - Domain-separated (`TAPSHIELD_ADDRESS_V1`) plus a per-kind seed tag
//! - Canonical bytes via postcard (length-prefixed fields, fixed order)
//! - SHA-256 over the canonical bytes
//!
//! Length prefixes make the encoding injective, so distinct seed tuples can
//! only collide through a SHA-256 collision.

use crate::errors::LedgerError;
use crate::identity::{parse_hex32, Identity};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const ADDRESS_DOMAIN: &[u8] = b"TAPSHIELD_ADDRESS_V1";

pub const FAUCET_SEED: &[u8] = b"faucet";
pub const CLAIM_SEED: &[u8] = b"claim";
pub const CLAIMANT_SEED: &[u8] = b"claimant";

/// 32-byte derived identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s.trim())
            .map(Self)
            .ok_or_else(|| LedgerError::InvalidIdentity(format!("invalid address {:?}", s)))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Serialize)]
struct AddressPayload<'a> {
    domain: &'static [u8],
    seeds: &'a [&'a [u8]],
}

/// Derive an address from an ordered list of seeds.
pub fn derive_address(seeds: &[&[u8]]) -> Address {
    let payload = AddressPayload {
        domain: ADDRESS_DOMAIN,
        seeds,
    };
    let canonical =
        postcard::to_allocvec(&payload).expect("byte-slice payload always serializes");
    let digest = Sha256::digest(&canonical);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Address(bytes)
}

/// Address of the registry owned by `operator`.
pub fn derive_faucet_address(operator: &Identity) -> Address {
    derive_address(&[FAUCET_SEED, operator.as_bytes()])
}

/// Address of the claim with faucet-wide `index` made by `claimer`.
pub fn derive_claim_address(claimer: &Identity, faucet_id: &Address, index: u64) -> Address {
    derive_address(&[
        CLAIM_SEED,
        claimer.as_bytes(),
        faucet_id.as_bytes(),
        &index.to_le_bytes(),
    ])
}

/// Address of the per-(faucet, claimer) cooldown sub-record.
pub fn derive_claimant_address(claimer: &Identity, faucet_id: &Address) -> Address {
    derive_address(&[CLAIMANT_SEED, claimer.as_bytes(), faucet_id.as_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let claimer = Identity::from_bytes([3u8; 32]);
        let faucet = derive_faucet_address(&Identity::from_bytes([9u8; 32]));

        let a = derive_claim_address(&claimer, &faucet, 5);
        let b = derive_claim_address(&claimer, &faucet, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_index_changes_address() {
        let claimer = Identity::from_bytes([3u8; 32]);
        let faucet = derive_faucet_address(&Identity::from_bytes([9u8; 32]));

        assert_ne!(
            derive_claim_address(&claimer, &faucet, 0),
            derive_claim_address(&claimer, &faucet, 1)
        );
    }

    #[test]
    fn test_seed_kinds_are_separated() {
        let id = Identity::from_bytes([4u8; 32]);
        let faucet = derive_faucet_address(&id);
        assert_ne!(derive_claimant_address(&id, &faucet), derive_claim_address(&id, &faucet, 0));
        assert_ne!(derive_faucet_address(&id), derive_address(&[CLAIM_SEED, id.as_bytes()]));
    }

    #[test]
    fn test_seed_boundaries_matter() {
        // Same concatenated bytes, different split
        let a = derive_address(&[b"ab", b"c"]);
        let b = derive_address(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_address_parse_round_trip() {
        let addr = derive_faucet_address(&Identity::from_bytes([1u8; 32]));
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
    }
}
