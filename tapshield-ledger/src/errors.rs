//! Error types for ledger operations.
//!
//! Every failure carries a stable machine-readable [`ErrorCode`] and an
//! [`ErrorClass`] so callers can tell a "wait and retry" policy rejection from
//! a hard infrastructure failure.

use crate::{Address, Identity};

/// Stable error codes, safe to expose over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// Faucet name exceeds the byte bound
    NameTooLong = 1000,
    /// Claim amount must be positive
    InvalidAmount = 1001,
    /// Cooldown must be positive
    InvalidCooldown = 1002,
    /// Malformed identity or address
    InvalidIdentity = 1003,
    /// Operator already owns a faucet
    FaucetAlreadyExists = 2000,
    /// No faucet for this operator
    UnregisteredFaucet = 2001,
    /// Cooldown window has not elapsed
    ClaimTooRecent = 2002,
    /// Another claim for the same claimer is mid-flight
    ClaimInProgress = 2003,
    /// Reservation token is unknown or was replaced
    ReservationNotFound = 2004,
    /// Journal read/write failed
    Storage = 9000,
    /// Encoding failed
    Serialization = 9001,
    /// Journal replay found inconsistent data
    Corrupted = 9002,
    /// Key handling or signature failure
    Crypto = 9003,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Coarse classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input, rejected before any state change.
    Validation,
    /// Well-formed request forbidden by a business rule.
    Policy,
    /// Storage, encoding or other environment failure.
    Infrastructure,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("faucet name is {len} bytes, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },

    #[error("claim amount must be greater than zero")]
    InvalidAmount,

    #[error("cooldown must be greater than zero seconds")]
    InvalidCooldown,

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("faucet already exists for operator {operator}")]
    FaucetAlreadyExists { operator: Identity },

    #[error("no faucet registered for operator {operator}")]
    UnregisteredFaucet { operator: Identity },

    #[error("claim too recent, retry after {retry_after_secs}s")]
    ClaimTooRecent { retry_after_secs: u64 },

    #[error("a claim for {claimer} on faucet {faucet_id} is already in progress")]
    ClaimInProgress { faucet_id: Address, claimer: Identity },

    #[error("reservation {0} not found")]
    ReservationNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger journal corrupted: {0}")]
    Corrupted(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NameTooLong { .. } => ErrorCode::NameTooLong,
            Self::InvalidAmount => ErrorCode::InvalidAmount,
            Self::InvalidCooldown => ErrorCode::InvalidCooldown,
            Self::InvalidIdentity(_) => ErrorCode::InvalidIdentity,
            Self::FaucetAlreadyExists { .. } => ErrorCode::FaucetAlreadyExists,
            Self::UnregisteredFaucet { .. } => ErrorCode::UnregisteredFaucet,
            Self::ClaimTooRecent { .. } => ErrorCode::ClaimTooRecent,
            Self::ClaimInProgress { .. } => ErrorCode::ClaimInProgress,
            Self::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            Self::Storage(_) => ErrorCode::Storage,
            Self::Serialization(_) => ErrorCode::Serialization,
            Self::Corrupted(_) => ErrorCode::Corrupted,
            Self::Crypto(_) => ErrorCode::Crypto,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Machine-readable code string for API bodies and logs.
    pub fn code_str(&self) -> &'static str {
        match self.code() {
            ErrorCode::NameTooLong => "NAME_TOO_LONG",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::InvalidCooldown => "INVALID_COOLDOWN",
            ErrorCode::InvalidIdentity => "INVALID_IDENTITY",
            ErrorCode::FaucetAlreadyExists => "FAUCET_ALREADY_EXISTS",
            ErrorCode::UnregisteredFaucet => "UNREGISTERED_FAUCET",
            ErrorCode::ClaimTooRecent => "COOLDOWN_ACTIVE",
            ErrorCode::ClaimInProgress => "CLAIM_IN_PROGRESS",
            ErrorCode::ReservationNotFound => "RESERVATION_NOT_FOUND",
            ErrorCode::Storage => "STORAGE",
            ErrorCode::Serialization => "SERIALIZATION",
            ErrorCode::Corrupted => "CORRUPTED",
            ErrorCode::Crypto => "CRYPTO",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NameTooLong { .. }
            | Self::InvalidAmount
            | Self::InvalidCooldown
            | Self::InvalidIdentity(_) => ErrorClass::Validation,
            Self::FaucetAlreadyExists { .. }
            | Self::UnregisteredFaucet { .. }
            | Self::ClaimTooRecent { .. }
            | Self::ClaimInProgress { .. }
            | Self::ReservationNotFound(_) => ErrorClass::Policy,
            Self::Storage(_)
            | Self::Serialization(_)
            | Self::Corrupted(_)
            | Self::Crypto(_)
            | Self::Internal(_) => ErrorClass::Infrastructure,
        }
    }

    /// Returns true if the same request may succeed later without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ClaimTooRecent { .. } | Self::ClaimInProgress { .. } | Self::Storage(_)
        )
    }

    /// Suggested wait before retrying, in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::ClaimTooRecent { retry_after_secs } => Some(*retry_after_secs),
            Self::ClaimInProgress { .. } => Some(1),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<postcard::Error> for LedgerError {
    fn from(err: postcard::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
