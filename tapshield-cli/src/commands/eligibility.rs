//! Eligibility command - preview the cooldown for a wallet

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::FaucetConfig;

use crate::ui;

pub async fn run(
    storage_dir: &Path,
    config: &FaucetConfig,
    wallet: &str,
    _verbose: bool,
) -> Result<()> {
    let claimer = super::parse_wallet(wallet)?;
    let key = super::load_operator_key(storage_dir, config)?;
    let ledger = super::open_ledger(storage_dir, config)?;
    let operator = key.identity();

    let verdict = ledger.check_eligibility(&operator, &claimer, config.cooldown_secs)?;

    ui::header("Claim Eligibility");
    ui::key_value("Wallet", &claimer.to_string());
    ui::key_value("Cooldown", &ui::duration(config.cooldown_secs));
    if let Some(last) = verdict.last_claim_at {
        ui::key_value("Last claim", &ui::timestamp(last));
    }
    if let Some(state) = ledger.claimant_state(&operator, &claimer)? {
        ui::key_value("Claims here", &state.claim_count.to_string());
    }

    if verdict.eligible {
        ui::success("Eligible to claim now");
    } else {
        ui::warning(&format!(
            "Not eligible for another {}",
            ui::duration(verdict.retry_after_secs)
        ));
        if let Some(next) = verdict.next_eligible_at {
            ui::key_value("Next claim", &ui::timestamp(next));
        }
    }

    Ok(())
}
