//! Stats command - show the faucet registry

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::FaucetConfig;

use crate::ui;

pub async fn run(storage_dir: &Path, config: &FaucetConfig, _verbose: bool) -> Result<()> {
    let key = super::load_operator_key(storage_dir, config)?;
    let ledger = super::open_ledger(storage_dir, config)?;
    let stats = ledger.get_faucet_stats(&key.identity())?;

    ui::header(&format!("Faucet: {}", stats.name));
    ui::key_value("Address", &stats.address.to_string());
    ui::key_value("Operator", &stats.operator.to_string());
    ui::key_value("Total claims", &stats.total_claims.to_string());
    ui::key_value("Created", &ui::timestamp(stats.created_at));
    ui::key_value("Claim amount", &ui::tokens(config.claim_amount));
    ui::key_value("Cooldown", &ui::duration(config.cooldown_secs));

    Ok(())
}
