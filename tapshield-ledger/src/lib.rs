//! # TapShield Claim Ledger
//!
//! A rate-limited, tamper-resistant ledger for faucet-style distributions:
//! each operator registers one faucet, and each claimer may claim from it at
//! most once per cooldown window.
//!
//! ## Security Model
//!
//! - Registries and claim records live at deterministic, collision-resistant
//!   addresses (SHA-256 over domain-separated postcard seeds), so anyone can
//!   recompute and check a record's identity
//! - Cooldown checks and record writes happen in one critical section; two
//!   concurrent first claims cannot both succeed
//! - [`ClaimAuthority`] pays before it records, holding a reservation across
//!   the transfer, so a failed payout never consumes a cooldown
//! - Paid claims come with an Ed25519-signed [`ClaimReceipt`]
//!
//! ## Example
//!
//! ```
//! use tapshield_ledger::{ClaimLedger, ClaimScope, Identity};
//!
//! let ledger = ClaimLedger::in_memory();
//! let operator = Identity::random();
//! let claimer = Identity::random();
//!
//! ledger.register_faucet(operator, "TEST FAUCET")?;
//! ledger.record_claim(&operator, &claimer, 4_000_000, 60)?;
//!
//! assert_eq!(ledger.get_faucet_stats(&operator)?.total_claims, 1);
//! assert_eq!(ledger.get_claim_history(&claimer, ClaimScope::AllFaucets)?.len(), 1);
//! assert!(ledger.record_claim(&operator, &claimer, 4_000_000, 60).is_err());
//! # Ok::<(), tapshield_ledger::LedgerError>(())
//! ```

pub mod address;
pub mod authority;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod receipt;
pub mod state;
pub mod store;
pub mod transfer;

pub use address::{derive_claim_address, derive_faucet_address, Address};
pub use authority::{AuthorityConfig, ClaimAuthority, ClaimError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FaucetConfig;
pub use cooldown::Eligibility;
pub use errors::{ErrorClass, ErrorCode, LedgerError};
pub use identity::{verify_signature, Identity, OperatorKey};
pub use ledger::{ClaimLedger, ClaimReservation, ClaimScope, LedgerConfig};
pub use receipt::ClaimReceipt;
pub use state::{ClaimRecord, ClaimantState, ClaimerProfile, FaucetRegistry, MAX_NAME_LEN};
pub use store::{FileLedgerStore, JournalEntry, LedgerStore, MemoryLedgerStore};
pub use transfer::{SimulatedTransfer, TransferConfirmation, TransferError, TransferExecutor};

pub type Result<T> = std::result::Result<T, LedgerError>;
