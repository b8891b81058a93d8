//! Claimer and operator identities.
//!
//! An [`Identity`] is a 32-byte public key rendered as lowercase hex. Operators
//! additionally hold an [`OperatorKey`] (Ed25519) used to sign claim receipts.

use crate::errors::LedgerError;
use ed25519_dalek::{Signature as DalekSig, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte public identity of an operator or claimer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; 32]);

impl Identity {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Random identity, handy for tests and demos.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl FromStr for Identity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex32(s.trim())
            .map(Self)
            .ok_or_else(|| LedgerError::InvalidIdentity(format!("expected 64 hex chars, got {:?}", s)))
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Identity::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn parse_hex32(s: &str) -> Option<[u8; 32]> {
    if s.len() != 64 {
        return None;
    }
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// Ed25519 signing key of a faucet operator.
///
/// Accepted textual forms:
/// - 64 hex chars (the 32-byte secret)
/// - a JSON byte array of 32 bytes, or 64 bytes (secret followed by public
///   key, the common wallet keypair export format)
#[derive(Clone)]
pub struct OperatorKey {
    signing_key: SigningKey,
}

impl OperatorKey {
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::from_secret_bytes(&secret)
    }

    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn parse(input: &str) -> Result<Self, LedgerError> {
        let input = input.trim();
        if let Some(secret) = parse_hex32(input) {
            return Ok(Self::from_secret_bytes(&secret));
        }

        let bytes: Vec<u8> = serde_json::from_str(input)
            .map_err(|_| LedgerError::Crypto("operator key is neither hex nor a JSON byte array".into()))?;
        match bytes.len() {
            32 | 64 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes[..32]);
                let key = Self::from_secret_bytes(&secret);
                if bytes.len() == 64 && bytes[32..] != key.identity().as_bytes()[..] {
                    return Err(LedgerError::Crypto(
                        "keypair public half does not match its secret".into(),
                    ));
                }
                Ok(key)
            }
            n => Err(LedgerError::Crypto(format!(
                "operator key must be 32 or 64 bytes, got {}",
                n
            ))),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity(self.signing_key.verifying_key().to_bytes())
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature made by `signer`.
///
/// `Ok(false)` means a well-formed but invalid signature; `Err` means the
/// identity is not a valid Ed25519 public key.
pub fn verify_signature(
    signer: &Identity,
    message: &[u8],
    signature: &[u8; 64],
) -> Result<bool, LedgerError> {
    let verifying_key = VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|e| LedgerError::Crypto(format!("invalid public key: {}", e)))?;
    let sig = DalekSig::from_bytes(signature);
    Ok(verifying_key.verify(message, &sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_hex_round_trip() {
        let id = Identity::from_bytes([7u8; 32]);
        let parsed: Identity = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_identity_rejects_bad_input() {
        assert!("".parse::<Identity>().is_err());
        assert!("abcd".parse::<Identity>().is_err());
        assert!("zz".repeat(32).parse::<Identity>().is_err());
    }

    #[test]
    fn test_identity_serializes_as_string() {
        let id = Identity::from_bytes([1u8; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
    }

    #[test]
    fn test_operator_key_parse_forms() {
        let key = OperatorKey::generate();

        let from_hex = OperatorKey::parse(&key.secret_hex()).unwrap();
        assert_eq!(from_hex.identity(), key.identity());

        let mut keypair = hex::decode(key.secret_hex()).unwrap();
        keypair.extend_from_slice(key.identity().as_bytes());
        let json = serde_json::to_string(&keypair).unwrap();
        let from_json = OperatorKey::parse(&json).unwrap();
        assert_eq!(from_json.identity(), key.identity());
    }

    #[test]
    fn test_operator_key_rejects_mismatched_keypair() {
        let key = OperatorKey::generate();
        let mut keypair = hex::decode(key.secret_hex()).unwrap();
        keypair.extend_from_slice(&[0u8; 32]);
        let json = serde_json::to_string(&keypair).unwrap();
        assert!(OperatorKey::parse(&json).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = OperatorKey::generate();
        let sig = key.sign(b"claim");
        assert!(verify_signature(&key.identity(), b"claim", &sig).unwrap());
        assert!(!verify_signature(&key.identity(), b"other", &sig).unwrap());
    }
}
