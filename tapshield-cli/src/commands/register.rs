//! Register command - create this operator's faucet

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::{FaucetConfig, LedgerError};

use crate::ui;

#[tracing::instrument(skip(storage_dir, config))]
pub async fn run(storage_dir: &Path, config: &FaucetConfig, _verbose: bool) -> Result<()> {
    let key = super::load_operator_key(storage_dir, config)?;
    let ledger = super::open_ledger(storage_dir, config)?;

    match ledger.register_faucet(key.identity(), &config.faucet_name) {
        Ok(address) => {
            ui::success(&format!("Faucet '{}' registered", config.faucet_name));
            ui::key_value("Faucet address", &address.to_string());
            ui::key_value("Operator", &key.identity().to_string());
        }
        Err(LedgerError::FaucetAlreadyExists { operator }) => {
            let existing = ledger.get_faucet_stats(&operator)?;
            ui::warning(&format!(
                "Operator already has faucet '{}'; nothing to do",
                existing.name
            ));
            ui::key_value("Faucet address", &existing.address.to_string());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
