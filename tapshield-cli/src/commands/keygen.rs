//! Keygen command - create the operator key

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::OperatorKey;

use crate::ui;

#[tracing::instrument(skip(storage_dir))]
pub async fn run(storage_dir: &Path, force: bool, verbose: bool) -> Result<()> {
    let path = super::key_path(storage_dir);

    if path.exists() && !force {
        if !ui::is_interactive() {
            anyhow::bail!(
                "Operator key already exists at {}. Pass --force to replace it.",
                path.display()
            );
        }
        ui::warning("Replacing the key orphans the faucet registered under it");
        if !ui::confirm("Overwrite the existing operator key?", false)? {
            ui::info("Keeping the existing key");
            return Ok(());
        }
    }

    let key = OperatorKey::generate();
    let saved = super::save_operator_key(storage_dir, &key)?;
    tracing::info!("Generated operator key {}", key.identity());

    ui::success("Operator key generated");
    ui::key_value("Operator", &key.identity().to_string());
    ui::key_value("Key file", &saved.display().to_string());
    if verbose {
        ui::key_value(
            "Faucet address",
            &tapshield_ledger::derive_faucet_address(&key.identity()).to_string(),
        );
    }
    ui::info("Run 'tapshield register --name <NAME>' to create the faucet");

    Ok(())
}
