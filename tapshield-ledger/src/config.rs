//! Faucet operator configuration.
//!
//! Defaults match a public test-token faucet: 0.1 token per claim, one claim
//! per wallet per day.

use crate::authority::AuthorityConfig;
use crate::errors::LedgerError;
use crate::identity::OperatorKey;
use crate::ledger::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CLAIM_AMOUNT: u64 = 100_000_000;
pub const DEFAULT_COOLDOWN_SECS: u64 = 86_400;
pub const DEFAULT_FAUCET_NAME: &str = "TapShield Faucet";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Operator secret key (hex or JSON byte array). Never written back out.
    #[serde(skip_serializing)]
    pub operator_key: Option<String>,
    pub faucet_name: String,
    pub claim_amount: u64,
    pub cooldown_secs: u64,
    pub data_dir: Option<PathBuf>,
    pub bind: String,
    /// Opening balance of the simulated treasury.
    pub treasury_balance: u64,
    pub reservation_ttl_secs: u64,
    pub transfer_timeout_secs: u64,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            operator_key: None,
            faucet_name: DEFAULT_FAUCET_NAME.to_string(),
            claim_amount: DEFAULT_CLAIM_AMOUNT,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            data_dir: None,
            bind: DEFAULT_BIND.to_string(),
            treasury_balance: 1_000 * DEFAULT_CLAIM_AMOUNT,
            reservation_ttl_secs: LedgerConfig::default().reservation_ttl_secs,
            transfer_timeout_secs: 30,
        }
    }
}

impl FaucetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operator_key(mut self, key: impl Into<String>) -> Self {
        self.operator_key = Some(key.into());
        self
    }

    pub fn with_faucet_name(mut self, name: impl Into<String>) -> Self {
        self.faucet_name = name.into();
        self
    }

    pub fn with_claim_amount(mut self, amount: u64) -> Self {
        self.claim_amount = amount;
        self
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_treasury_balance(mut self, balance: u64) -> Self {
        self.treasury_balance = balance;
        self
    }

    pub fn with_reservation_ttl(mut self, secs: u64) -> Self {
        self.reservation_ttl_secs = secs;
        self
    }

    pub fn with_transfer_timeout(mut self, secs: u64) -> Self {
        self.transfer_timeout_secs = secs;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `TAPSHIELD_OPERATOR_KEY` - operator secret (hex or JSON byte array)
    /// - `FAUCET_PVT_KEY` - legacy JSON byte array, used if the above is unset
    /// - `TAPSHIELD_FAUCET_NAME` - registry name (max 32 bytes)
    /// - `TAPSHIELD_CLAIM_AMOUNT` - smallest units per claim
    /// - `TAPSHIELD_COOLDOWN_SECS` - seconds between claims per wallet
    /// - `TAPSHIELD_DATA_DIR` - journal directory
    /// - `TAPSHIELD_BIND` - HTTP listen address
    /// - `TAPSHIELD_TREASURY` - simulated treasury opening balance
    /// - `TAPSHIELD_RESERVATION_TTL_SECS` - age at which an unfinished claim stops blocking its wallet
    /// - `TAPSHIELD_TRANSFER_TIMEOUT_SECS` - seconds to wait for a transfer to confirm
    ///
    /// Unparseable numbers are ignored and the default kept.
    ///
    /// # Example
    ///
    /// ```bash
    /// export TAPSHIELD_OPERATOR_KEY=9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60
    /// export TAPSHIELD_COOLDOWN_SECS=3600
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = lookup("TAPSHIELD_OPERATOR_KEY").or_else(|| lookup("FAUCET_PVT_KEY")) {
            config = config.with_operator_key(key);
        }
        if let Some(name) = lookup("TAPSHIELD_FAUCET_NAME") {
            config = config.with_faucet_name(name);
        }
        if let Some(amount) = lookup("TAPSHIELD_CLAIM_AMOUNT").and_then(|v| v.parse().ok()) {
            config = config.with_claim_amount(amount);
        }
        if let Some(secs) = lookup("TAPSHIELD_COOLDOWN_SECS").and_then(|v| v.parse().ok()) {
            config = config.with_cooldown(secs);
        }
        if let Some(dir) = lookup("TAPSHIELD_DATA_DIR") {
            config = config.with_data_dir(dir);
        }
        if let Some(bind) = lookup("TAPSHIELD_BIND") {
            config = config.with_bind(bind);
        }
        if let Some(balance) = lookup("TAPSHIELD_TREASURY").and_then(|v| v.parse().ok()) {
            config = config.with_treasury_balance(balance);
        }
        if let Some(secs) = lookup("TAPSHIELD_RESERVATION_TTL_SECS").and_then(|v| v.parse().ok()) {
            config = config.with_reservation_ttl(secs);
        }
        if let Some(secs) = lookup("TAPSHIELD_TRANSFER_TIMEOUT_SECS").and_then(|v| v.parse().ok())
        {
            config = config.with_transfer_timeout(secs);
        }

        config
    }

    /// Parse the configured operator key, if any.
    pub fn operator_key(&self) -> Result<Option<OperatorKey>, LedgerError> {
        self.operator_key
            .as_deref()
            .map(OperatorKey::parse)
            .transpose()
    }

    pub fn authority_config(&self) -> AuthorityConfig {
        AuthorityConfig {
            claim_amount: self.claim_amount,
            cooldown_seconds: self.cooldown_secs,
            transfer_timeout: Duration::from_secs(self.transfer_timeout_secs),
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            reservation_ttl_secs: self.reservation_ttl_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FaucetConfig::default();
        assert_eq!(config.claim_amount, 100_000_000);
        assert_eq!(config.cooldown_secs, 86_400);
        assert_eq!(config.authority_config().cooldown_seconds, 86_400);
        assert!(config.operator_key().unwrap().is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = FaucetConfig::from_lookup(lookup(&[
            ("TAPSHIELD_FAUCET_NAME", "TEST FAUCET"),
            ("TAPSHIELD_CLAIM_AMOUNT", "4000000"),
            ("TAPSHIELD_COOLDOWN_SECS", "60"),
            ("TAPSHIELD_BIND", "0.0.0.0:9000"),
        ]));
        assert_eq!(config.faucet_name, "TEST FAUCET");
        assert_eq!(config.claim_amount, 4_000_000);
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(config.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_timeouts_from_lookup() {
        let config = FaucetConfig::from_lookup(lookup(&[
            ("TAPSHIELD_RESERVATION_TTL_SECS", "45"),
            ("TAPSHIELD_TRANSFER_TIMEOUT_SECS", "7"),
        ]));
        assert_eq!(config.ledger_config().reservation_ttl_secs, 45);
        assert_eq!(
            config.authority_config().transfer_timeout,
            Duration::from_secs(7)
        );

        let built = FaucetConfig::new()
            .with_reservation_ttl(45)
            .with_transfer_timeout(7);
        assert_eq!(built, config);
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = FaucetConfig::from_lookup(lookup(&[("TAPSHIELD_COOLDOWN_SECS", "soon")]));
        assert_eq!(config.cooldown_secs, DEFAULT_COOLDOWN_SECS);
    }

    #[test]
    fn test_legacy_key_variable() {
        let key = OperatorKey::generate();
        let json = serde_json::to_string(&hex::decode(key.secret_hex()).unwrap()).unwrap();
        let config = FaucetConfig::from_lookup(lookup(&[("FAUCET_PVT_KEY", json.as_str())]));

        let parsed = config.operator_key().unwrap().unwrap();
        assert_eq!(parsed.identity(), key.identity());
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = FaucetConfig::new().with_operator_key("00".repeat(32));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("operator_key"));
    }
}
