//! The claim ledger state machine.
//!
//! # Atomicity
//!
//! All state sits behind one mutex. Each mutating operation validates,
//! appends its journal entry and applies the change inside a single critical
//! section, so two claims for the same (faucet, claimer) pair can never both
//! observe "no recent claim".
//!
//! # Cooldown chaining
//!
//! Record addresses use the faucet-wide counter, but the cooldown check is
//! chained through a per-(faucet, claimer) [`ClaimantState`]. Claims by other
//! claimers in between never hide a claimer's own previous record.

use crate::address::{derive_claim_address, Address};
use crate::clock::{Clock, SystemClock};
use crate::cooldown::Eligibility;
use crate::errors::LedgerError;
use crate::identity::Identity;
use crate::state::{ClaimRecord, ClaimantState, ClaimerProfile, FaucetRegistry};
use crate::store::{JournalEntry, LedgerStore, MemoryLedgerStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Tunables for the ledger itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Reservations older than this are treated as abandoned.
    pub reservation_ttl_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reservation_ttl_secs: 300,
        }
    }
}

/// Which registries a history query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimScope {
    AllFaucets,
    Faucet(Identity),
}

/// A claim admitted by the ledger but not yet written.
///
/// Must be passed to either [`ClaimLedger::commit_claim`] or
/// [`ClaimLedger::rollback_claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReservation {
    pub token_id: String,
    pub operator: Identity,
    pub faucet_id: Address,
    pub claimer: Identity,
    pub amount: u64,
    pub cooldown_seconds: u64,
    pub reserved_at: i64,
}

type PairKey = (Address, Identity);

#[derive(Debug, Default)]
struct LedgerState {
    faucets: HashMap<Identity, FaucetRegistry>,
    records: HashMap<Address, ClaimRecord>,
    claimants: HashMap<PairKey, ClaimantState>,
    profiles: HashMap<Identity, ClaimerProfile>,
    reservations: HashMap<PairKey, ClaimReservation>,
}

impl LedgerState {
    fn registry(&self, operator: &Identity) -> Result<&FaucetRegistry> {
        self.faucets
            .get(operator)
            .ok_or(LedgerError::UnregisteredFaucet {
                operator: *operator,
            })
    }

    fn operator_of(&self, faucet_id: &Address) -> Option<Identity> {
        self.faucets
            .values()
            .find(|f| &f.address == faucet_id)
            .map(|f| f.operator)
    }

    fn last_claim_at(&self, key: &PairKey) -> Option<i64> {
        self.claimants.get(key).map(|c| c.last_claim_at)
    }

    /// Build the next record for `claimer` without mutating anything.
    fn next_record(
        &self,
        operator: &Identity,
        claimer: Identity,
        amount: u64,
        now: i64,
    ) -> Result<(Address, ClaimRecord)> {
        let registry = self.registry(operator)?;
        let index = registry.total_claims;
        let address = derive_claim_address(&claimer, &registry.address, index);

        // Addresses are unique per index; a hit here means the journal and
        // counter disagree.
        if self.records.contains_key(&address) {
            return Err(LedgerError::Corrupted(format!(
                "record {} already exists at index {}",
                address, index
            )));
        }

        let chain = self.claimants.get(&(registry.address, claimer));
        let record = ClaimRecord {
            claimer,
            faucet_id: registry.address,
            amount,
            timestamp: now,
            index,
            sequence: chain.map_or(0, |c| c.claim_count),
            previous: chain.map(|c| c.last_record),
        };
        Ok((address, record))
    }

    /// Apply a journal entry. Used both for live writes and for replay, so
    /// it re-checks the counter invariant.
    fn apply(&mut self, entry: JournalEntry) -> Result<()> {
        match entry {
            JournalEntry::FaucetRegistered { registry } => {
                if self.faucets.contains_key(&registry.operator) {
                    return Err(LedgerError::Corrupted(format!(
                        "duplicate registry for operator {}",
                        registry.operator
                    )));
                }
                self.faucets.insert(registry.operator, registry);
            }
            JournalEntry::ClaimRecorded { address, record } => {
                let operator = self.operator_of(&record.faucet_id).ok_or_else(|| {
                    LedgerError::Corrupted(format!("claim {} for unknown faucet", address))
                })?;
                let registry = self
                    .faucets
                    .get_mut(&operator)
                    .ok_or_else(|| LedgerError::Internal("registry vanished".into()))?;

                if record.index != registry.total_claims || record.address() != address {
                    return Err(LedgerError::Corrupted(format!(
                        "claim {} has index {} but faucet counter is {}",
                        address, record.index, registry.total_claims
                    )));
                }
                registry.total_claims += 1;

                let key = (record.faucet_id, record.claimer);
                let claimant = self.claimants.entry(key).or_insert(ClaimantState {
                    claimer: record.claimer,
                    faucet_id: record.faucet_id,
                    claim_count: 0,
                    last_claim_at: record.timestamp,
                    last_record: address,
                });
                claimant.claim_count += 1;
                claimant.last_claim_at = record.timestamp;
                claimant.last_record = address;

                let profile = self.profiles.entry(record.claimer).or_insert(ClaimerProfile {
                    claimer: record.claimer,
                    last_claim_timestamp: record.timestamp,
                    last_faucet: record.faucet_id,
                    total_claims_across_faucets: 0,
                });
                profile.total_claims_across_faucets += 1;
                profile.last_claim_timestamp = record.timestamp;
                profile.last_faucet = record.faucet_id;

                self.records.insert(address, record);
            }
        }
        Ok(())
    }
}

/// Rate-limited, journaled claim ledger.
pub struct ClaimLedger {
    state: Mutex<LedgerState>,
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl ClaimLedger {
    /// Open a ledger over `store`, replaying its journal.
    pub fn open(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Result<Self> {
        let mut state = LedgerState::default();
        let entries = store.load()?;
        let replayed = entries.len();
        for entry in entries {
            state.apply(entry)?;
        }
        tracing::debug!(
            "Ledger opened: {} entries, {} faucets, {} claims",
            replayed,
            state.faucets.len(),
            state.records.len()
        );

        Ok(Self {
            state: Mutex::new(state),
            store,
            clock,
            config,
        })
    }

    /// Volatile ledger on the system clock.
    pub fn in_memory() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Volatile ledger on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            store: Arc::new(MemoryLedgerStore::new()),
            clock,
            config: LedgerConfig::default(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|e| LedgerError::Internal(format!("Lock poisoned: {}", e)))
    }

    /// Persist then apply. The in-memory state only changes if the append
    /// succeeded.
    fn commit_entry(&self, state: &mut LedgerState, entry: JournalEntry) -> Result<()> {
        self.store.append(&entry)?;
        state.apply(entry)
    }

    /// Register a faucet for `operator`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NameTooLong`] if `name` exceeds 32 bytes
    /// - [`LedgerError::FaucetAlreadyExists`] if the operator already has one
    pub fn register_faucet(&self, operator: Identity, name: &str) -> Result<Address> {
        FaucetRegistry::validate_name(name)?;

        let mut state = self.lock()?;
        if state.faucets.contains_key(&operator) {
            tracing::warn!("Duplicate faucet registration for {}", operator);
            return Err(LedgerError::FaucetAlreadyExists { operator });
        }

        let registry = FaucetRegistry::new(operator, name.to_string(), self.clock.now())?;
        let address = registry.address;
        self.commit_entry(&mut state, JournalEntry::FaucetRegistered { registry })?;

        tracing::info!("Faucet {:?} registered at {}", name, address);
        Ok(address)
    }

    fn validate_claim(amount: u64, cooldown_seconds: u64) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if cooldown_seconds == 0 {
            return Err(LedgerError::InvalidCooldown);
        }
        Ok(())
    }

    /// Drop every reservation older than the TTL.
    fn sweep_reservations(&self, state: &mut LedgerState, now: i64) {
        let ttl = i64::try_from(self.config.reservation_ttl_secs).unwrap_or(i64::MAX);
        state.reservations.retain(|_, pending| {
            let live = now.saturating_sub(pending.reserved_at) < ttl;
            if !live {
                tracing::warn!(
                    "Dropping abandoned reservation {} for {}",
                    pending.token_id,
                    pending.claimer
                );
            }
            live
        });
    }

    /// Check the cooldown and pending reservations for a pair. Sweeps
    /// abandoned reservations first.
    fn admit(
        &self,
        state: &mut LedgerState,
        key: &PairKey,
        now: i64,
        cooldown_seconds: u64,
    ) -> Result<()> {
        self.sweep_reservations(state, now);
        if state.reservations.contains_key(key) {
            return Err(LedgerError::ClaimInProgress {
                faucet_id: key.0,
                claimer: key.1,
            });
        }

        let verdict = Eligibility::evaluate(state.last_claim_at(key), now, cooldown_seconds);
        if !verdict.eligible {
            tracing::warn!(
                "Claim by {} rejected: cooldown active for {}s",
                key.1,
                verdict.retry_after_secs
            );
            return Err(LedgerError::ClaimTooRecent {
                retry_after_secs: verdict.retry_after_secs,
            });
        }
        Ok(())
    }

    /// Record a claim in one atomic step.
    ///
    /// Validates the cooldown against the claimer's previous record under
    /// this faucet, writes the new record and bumps `total_claims` by one.
    /// On any error nothing is written.
    pub fn record_claim(
        &self,
        operator: &Identity,
        claimer: &Identity,
        amount: u64,
        cooldown_seconds: u64,
    ) -> Result<Address> {
        Self::validate_claim(amount, cooldown_seconds)?;

        let mut state = self.lock()?;
        let faucet_id = state.registry(operator)?.address;
        let now = self.clock.now();
        self.admit(&mut state, &(faucet_id, *claimer), now, cooldown_seconds)?;

        let (address, record) = state.next_record(operator, *claimer, amount, now)?;
        tracing::debug!(
            "Recording claim {} (index {}, sequence {})",
            address,
            record.index,
            record.sequence
        );
        self.commit_entry(&mut state, JournalEntry::ClaimRecorded { address, record })?;

        tracing::info!("Claim {} recorded: {} units to {}", address, amount, claimer);
        Ok(address)
    }

    /// Admit a claim and hold the claimer's slot until commit or rollback.
    ///
    /// While held, further claims for the same pair fail with
    /// [`LedgerError::ClaimInProgress`].
    pub fn reserve_claim(
        &self,
        operator: &Identity,
        claimer: &Identity,
        amount: u64,
        cooldown_seconds: u64,
    ) -> Result<ClaimReservation> {
        Self::validate_claim(amount, cooldown_seconds)?;

        let mut state = self.lock()?;
        let faucet_id = state.registry(operator)?.address;
        let now = self.clock.now();
        let key = (faucet_id, *claimer);
        self.admit(&mut state, &key, now, cooldown_seconds)?;

        let reservation = ClaimReservation {
            token_id: uuid::Uuid::new_v4().to_string(),
            operator: *operator,
            faucet_id,
            claimer: *claimer,
            amount,
            cooldown_seconds,
            reserved_at: now,
        };
        state.reservations.insert(key, reservation.clone());

        tracing::debug!("Reserved claim {} for {}", reservation.token_id, claimer);
        Ok(reservation)
    }

    /// Write the record for a held reservation.
    pub fn commit_claim(&self, reservation: &ClaimReservation) -> Result<Address> {
        let mut state = self.lock()?;
        let key = (reservation.faucet_id, reservation.claimer);

        match state.reservations.get(&key) {
            Some(held) if held.token_id == reservation.token_id => {}
            _ => return Err(LedgerError::ReservationNotFound(reservation.token_id.clone())),
        }

        let now = self.clock.now();
        let (address, record) = state.next_record(
            &reservation.operator,
            reservation.claimer,
            reservation.amount,
            now,
        )?;
        self.commit_entry(&mut state, JournalEntry::ClaimRecorded { address, record })?;
        state.reservations.remove(&key);

        tracing::info!(
            "Claim {} committed: {} units to {}",
            address,
            reservation.amount,
            reservation.claimer
        );
        Ok(address)
    }

    /// Release a held reservation. Releasing twice is a no-op.
    pub fn rollback_claim(&self, reservation: &ClaimReservation) -> Result<()> {
        let mut state = self.lock()?;
        let key = (reservation.faucet_id, reservation.claimer);
        if state
            .reservations
            .get(&key)
            .is_some_and(|held| held.token_id == reservation.token_id)
        {
            state.reservations.remove(&key);
            tracing::debug!("Rolled back reservation {}", reservation.token_id);
        }
        Ok(())
    }

    /// Preview whether `claimer` could claim from `operator`'s faucet now.
    pub fn check_eligibility(
        &self,
        operator: &Identity,
        claimer: &Identity,
        cooldown_seconds: u64,
    ) -> Result<Eligibility> {
        if cooldown_seconds == 0 {
            return Err(LedgerError::InvalidCooldown);
        }
        let state = self.lock()?;
        let faucet_id = state.registry(operator)?.address;
        Ok(Eligibility::evaluate(
            state.last_claim_at(&(faucet_id, *claimer)),
            self.clock.now(),
            cooldown_seconds,
        ))
    }

    /// Snapshot of a faucet registry.
    pub fn get_faucet_stats(&self, operator: &Identity) -> Result<FaucetRegistry> {
        self.lock()?.registry(operator).cloned()
    }

    /// All records of `claimer`, oldest first.
    pub fn get_claim_history(
        &self,
        claimer: &Identity,
        scope: ClaimScope,
    ) -> Result<Vec<ClaimRecord>> {
        let state = self.lock()?;
        let faucet_filter = match scope {
            ClaimScope::AllFaucets => None,
            ClaimScope::Faucet(operator) => Some(state.registry(&operator)?.address),
        };

        let mut history: Vec<ClaimRecord> = state
            .records
            .values()
            .filter(|r| &r.claimer == claimer)
            .filter(|r| faucet_filter.is_none_or(|f| r.faucet_id == f))
            .cloned()
            .collect();
        history.sort_by_key(|r| (r.timestamp, r.faucet_id, r.index));
        Ok(history)
    }

    pub fn get_record(&self, address: &Address) -> Result<Option<ClaimRecord>> {
        Ok(self.lock()?.records.get(address).cloned())
    }

    /// True if a record exists at `address` and its seeds re-derive to it.
    pub fn verify_record(&self, address: &Address) -> Result<bool> {
        Ok(self
            .lock()?
            .records
            .get(address)
            .is_some_and(|r| &r.address() == address))
    }

    /// The claimer's records under one faucet, newest first, following the
    /// `previous` links.
    pub fn claim_chain(&self, operator: &Identity, claimer: &Identity) -> Result<Vec<ClaimRecord>> {
        let state = self.lock()?;
        let faucet_id = state.registry(operator)?.address;

        let mut chain = Vec::new();
        let mut cursor = state
            .claimants
            .get(&(faucet_id, *claimer))
            .map(|c| c.last_record);
        while let Some(address) = cursor {
            let record = state.records.get(&address).ok_or_else(|| {
                LedgerError::Corrupted(format!("chain link {} is missing", address))
            })?;
            cursor = record.previous;
            chain.push(record.clone());
        }
        Ok(chain)
    }

    /// Cooldown chain head for `claimer` under `operator`'s faucet.
    pub fn claimant_state(
        &self,
        operator: &Identity,
        claimer: &Identity,
    ) -> Result<Option<ClaimantState>> {
        let state = self.lock()?;
        let faucet_id = state.registry(operator)?.address;
        Ok(state.claimants.get(&(faucet_id, *claimer)).cloned())
    }

    pub fn claimer_profile(&self, claimer: &Identity) -> Result<Option<ClaimerProfile>> {
        Ok(self.lock()?.profiles.get(claimer).cloned())
    }

    pub fn pending_reservations(&self) -> Result<usize> {
        Ok(self.lock()?.reservations.len())
    }
}

impl std::fmt::Debug for ClaimLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
