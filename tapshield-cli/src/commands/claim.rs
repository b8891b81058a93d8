//! Claim command - pay out one claim through the authority

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::{ClaimError, FaucetConfig};

use crate::ui;

#[tracing::instrument(skip(storage_dir, config))]
pub async fn run(
    storage_dir: &Path,
    config: &FaucetConfig,
    wallet: &str,
    verbose: bool,
) -> Result<()> {
    let claimer = super::parse_wallet(wallet)?;
    let authority = super::build_authority(storage_dir, config)?;
    super::require_faucet(&authority)?;

    let spinner = ui::spinner(&format!(
        "Sending {} to {}...",
        ui::tokens(config.claim_amount),
        claimer
    ));
    let result = authority.request_default_claim(&claimer).await;
    spinner.finish_and_clear();

    match result {
        Ok(receipt) => {
            ui::success("Claim paid");
            ui::key_value("Record", &receipt.record_id.to_string());
            ui::key_value("Amount", &ui::tokens(receipt.amount));
            ui::key_value("Claim index", &receipt.index.to_string());
            ui::key_value("Transfer", &receipt.transfer_signature);
            if verbose {
                ui::separator();
                ui::json(&serde_json::to_value(&receipt)?);
            }
            Ok(())
        }
        Err(e) if e.is_cooldown() => {
            let hint = match &e {
                ClaimError::Ledger(inner) => inner.retry_after_secs(),
                _ => None,
            };
            ui::error(&format!("{}", e));
            if let Some(secs) = hint {
                ui::info(&format!("Try again in {}", ui::duration(secs)));
            }
            Err(e.into())
        }
        Err(ClaimError::TransferTimedOut { timeout_ms }) => {
            ui::warning(&format!(
                "Transfer did not confirm within {}ms; check 'tapshield history {}' before retrying",
                timeout_ms, claimer
            ));
            Err(ClaimError::TransferTimedOut { timeout_ms }.into())
        }
        Err(e) => Err(e.into()),
    }
}
