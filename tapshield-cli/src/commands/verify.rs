//! Verify command - check a record address against the ledger

use anyhow::Result;
use std::path::Path;
use tapshield_ledger::{Address, FaucetConfig};

use crate::ui;

pub async fn run(
    storage_dir: &Path,
    config: &FaucetConfig,
    record: &str,
    _verbose: bool,
) -> Result<()> {
    let address: Address = record.trim().parse()?;
    let ledger = super::open_ledger(storage_dir, config)?;

    if !ledger.verify_record(&address)? {
        ui::error(&format!("No valid claim record at {}", address));
        anyhow::bail!("record {} not found", address);
    }

    if let Some(record) = ledger.get_record(&address)? {
        ui::success("Record verified");
        ui::key_value("Claimer", &record.claimer.to_string());
        ui::key_value("Faucet", &record.faucet_id.to_string());
        ui::key_value("Index", &record.index.to_string());
        ui::key_value("Amount", &ui::tokens(record.amount));
        ui::key_value("Time", &ui::timestamp(record.timestamp));
    }

    Ok(())
}
