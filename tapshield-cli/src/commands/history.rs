//! History command - list a wallet's claims

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::{ClaimScope, FaucetConfig};

use crate::ui;

pub async fn run(
    storage_dir: &Path,
    config: &FaucetConfig,
    wallet: &str,
    all_faucets: bool,
    verbose: bool,
) -> Result<()> {
    let claimer = super::parse_wallet(wallet)?;
    let ledger = super::open_ledger(storage_dir, config)?;

    let scope = if all_faucets {
        ClaimScope::AllFaucets
    } else {
        let key = super::load_operator_key(storage_dir, config)?;
        ClaimScope::Faucet(key.identity())
    };
    let history = ledger.get_claim_history(&claimer, scope)?;

    ui::header(&format!("Claim History ({})", history.len()));
    if history.is_empty() {
        ui::info("No claims recorded for this wallet");
        return Ok(());
    }

    for record in &history {
        ui::separator();
        ui::key_value("Record", &record.address().to_string());
        ui::key_value("Time", &ui::timestamp(record.timestamp));
        ui::key_value("Amount", &ui::tokens(record.amount));
        if all_faucets || verbose {
            ui::key_value("Faucet", &record.faucet_id.to_string());
        }
        if verbose {
            ui::key_value("Index", &record.index.to_string());
            if let Some(previous) = &record.previous {
                ui::key_value("Previous", &previous.to_string());
            }
        }
    }

    if let Some(profile) = ledger.claimer_profile(&claimer)? {
        ui::separator();
        ui::key_value(
            "Claims across faucets",
            &profile.total_claims_across_faucets.to_string(),
        );
    }

    Ok(())
}
