//! CLI command implementations

pub mod claim;
pub mod eligibility;
pub mod history;
pub mod keygen;
pub mod register;
pub mod serve;
pub mod stats;
pub mod verify;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tapshield_ledger::{
    Address, ClaimAuthority, ClaimLedger, FaucetConfig, FileLedgerStore, Identity, LedgerError,
    OperatorKey, SimulatedTransfer, SystemClock,
};

/// On-disk operator key file.
#[derive(Serialize, Deserialize)]
pub struct KeyFile {
    pub identity: Identity,
    pub secret_key: String,
    pub created_at: i64,
}

/// Get the path to the operator key file
pub fn key_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join("operator.json")
}

/// Directory holding the ledger journal
pub fn data_dir(storage_dir: &Path, config: &FaucetConfig) -> PathBuf {
    config
        .data_dir
        .clone()
        .unwrap_or_else(|| storage_dir.to_path_buf())
}

/// Write the operator key with owner-only permissions
pub fn save_operator_key(storage_dir: &Path, key: &OperatorKey) -> Result<PathBuf> {
    std::fs::create_dir_all(storage_dir)?;
    let path = key_path(storage_dir);
    let file = KeyFile {
        identity: key.identity(),
        secret_key: key.secret_hex(),
        created_at: chrono::Utc::now().timestamp(),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(path)
}

/// Load the operator key: environment first, then the key file
pub fn load_operator_key(storage_dir: &Path, config: &FaucetConfig) -> Result<OperatorKey> {
    if let Some(key) = config.operator_key()? {
        tracing::debug!("Using operator key from environment");
        return Ok(key);
    }

    let path = key_path(storage_dir);
    if !path.exists() {
        anyhow::bail!("No operator key configured. Run 'tapshield keygen' first.");
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: KeyFile = serde_json::from_str(&contents)
        .with_context(|| format!("Malformed key file {}", path.display()))?;
    let key = OperatorKey::parse(&file.secret_key)?;

    if key.identity() != file.identity {
        anyhow::bail!("Key file {} does not match its identity", path.display());
    }
    Ok(key)
}

/// Open the journaled ledger under the data directory
pub fn open_ledger(storage_dir: &Path, config: &FaucetConfig) -> Result<Arc<ClaimLedger>> {
    let store = FileLedgerStore::in_dir(&data_dir(storage_dir, config))?;
    tracing::debug!("Opening ledger journal {}", store.path().display());
    let ledger = ClaimLedger::open(
        Arc::new(store),
        Arc::new(SystemClock),
        config.ledger_config(),
    )?;
    Ok(Arc::new(ledger))
}

/// Build a claim authority paying from a simulated treasury
pub fn build_authority(storage_dir: &Path, config: &FaucetConfig) -> Result<ClaimAuthority> {
    let key = load_operator_key(storage_dir, config)?;
    let ledger = open_ledger(storage_dir, config)?;

    let treasury = SimulatedTransfer::new();
    treasury.fund(&key.identity(), config.treasury_balance);

    Ok(ClaimAuthority::new(
        ledger,
        key,
        Arc::new(treasury),
        config.authority_config(),
    ))
}

/// Address of the operator's registered faucet
pub fn require_faucet(authority: &ClaimAuthority) -> Result<Address> {
    match authority.stats() {
        Ok(registry) => Ok(registry.address),
        Err(LedgerError::UnregisteredFaucet { operator }) => anyhow::bail!(
            "No faucet registered for operator {}. Run 'tapshield register --name <NAME>' first.",
            operator
        ),
        Err(e) => Err(e.into()),
    }
}

/// Parse a wallet argument
pub fn parse_wallet(wallet: &str) -> Result<Identity> {
    wallet
        .trim()
        .parse()
        .with_context(|| format!("Invalid wallet address '{}'", wallet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_round_trip() {
        let dir = TempDir::new().unwrap();
        let key = OperatorKey::generate();
        save_operator_key(dir.path(), &key).unwrap();

        let loaded = load_operator_key(dir.path(), &FaucetConfig::default()).unwrap();
        assert_eq!(loaded.identity(), key.identity());
    }

    #[test]
    fn test_env_key_takes_precedence() {
        let dir = TempDir::new().unwrap();
        save_operator_key(dir.path(), &OperatorKey::generate()).unwrap();

        let env_key = OperatorKey::generate();
        let config = FaucetConfig::default().with_operator_key(env_key.secret_hex());
        let loaded = load_operator_key(dir.path(), &config).unwrap();
        assert_eq!(loaded.identity(), env_key.identity());
    }

    #[test]
    fn test_missing_key_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_operator_key(dir.path(), &FaucetConfig::default()).is_err());
    }

    #[test]
    fn test_require_faucet_does_not_register() {
        let dir = TempDir::new().unwrap();
        save_operator_key(dir.path(), &OperatorKey::generate()).unwrap();
        let authority = build_authority(dir.path(), &FaucetConfig::default()).unwrap();

        let err = require_faucet(&authority).unwrap_err();
        assert!(err.to_string().contains("tapshield register"));
        assert!(authority.stats().is_err());

        let address = authority.register("TEST FAUCET").unwrap();
        assert_eq!(require_faucet(&authority).unwrap(), address);
    }

    #[test]
    fn test_parse_wallet() {
        let id = Identity::random();
        assert_eq!(parse_wallet(&format!(" {} ", id)).unwrap(), id);
        assert!(parse_wallet("not-a-wallet").is_err());
    }
}
