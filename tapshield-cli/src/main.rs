//! TapShield CLI
//!
//! Operator tool for a rate-limited faucet: key management, registration,
//! claims, inspection and the HTTP claim endpoint.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tapshield_ledger::FaucetConfig;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "tapshield")]
#[command(about = "TapShield - rate-limited faucet claim ledger", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory for the operator key and journal
    #[arg(long, global = true, env = "TAPSHIELD_DATA_DIR")]
    storage_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new operator key
    Keygen {
        /// Overwrite an existing key without asking
        #[arg(long)]
        force: bool,
    },

    /// Register this operator's faucet
    Register {
        /// Faucet name (at most 32 bytes)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Pay out a claim to a wallet
    Claim {
        /// Claimer wallet (hex public key)
        wallet: String,

        /// Amount in smallest units
        #[arg(short, long)]
        amount: Option<u64>,

        /// Cooldown in seconds
        #[arg(short, long)]
        cooldown: Option<u64>,
    },

    /// Check whether a wallet may claim now
    Eligibility {
        /// Claimer wallet (hex public key)
        wallet: String,

        /// Cooldown in seconds
        #[arg(short, long)]
        cooldown: Option<u64>,
    },

    /// Show faucet statistics
    Stats,

    /// Show the claim history of a wallet
    History {
        /// Claimer wallet (hex public key)
        wallet: String,

        /// Include claims from every faucet in the journal
        #[arg(long)]
        all_faucets: bool,
    },

    /// Verify a claim record address
    Verify {
        /// Record address (hex)
        record: String,
    },

    /// Serve the HTTP claim endpoint
    Serve {
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tapshield_cli=debug,tapshield_ledger=debug,actix_web=info")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("tapshield_cli=info,tapshield_ledger=warn,actix_web=warn")
            .init();
    }

    let config = FaucetConfig::from_env();

    // Setup storage directory
    let storage_dir = if let Some(dir) = cli.storage_dir {
        std::path::PathBuf::from(dir)
    } else {
        dirs::data_local_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("tapshield")
    };

    // Dispatch commands
    match cli.command {
        Commands::Keygen { force } => {
            commands::keygen::run(&storage_dir, force, cli.verbose).await?;
        }
        Commands::Register { name } => {
            let config = match name {
                Some(name) => config.with_faucet_name(name),
                None => config,
            };
            commands::register::run(&storage_dir, &config, cli.verbose).await?;
        }
        Commands::Claim {
            wallet,
            amount,
            cooldown,
        } => {
            let mut config = config;
            if let Some(amount) = amount {
                config = config.with_claim_amount(amount);
            }
            if let Some(cooldown) = cooldown {
                config = config.with_cooldown(cooldown);
            }
            commands::claim::run(&storage_dir, &config, &wallet, cli.verbose).await?;
        }
        Commands::Eligibility { wallet, cooldown } => {
            let config = match cooldown {
                Some(cooldown) => config.with_cooldown(cooldown),
                None => config,
            };
            commands::eligibility::run(&storage_dir, &config, &wallet, cli.verbose).await?;
        }
        Commands::Stats => {
            commands::stats::run(&storage_dir, &config, cli.verbose).await?;
        }
        Commands::History {
            wallet,
            all_faucets,
        } => {
            commands::history::run(&storage_dir, &config, &wallet, all_faucets, cli.verbose)
                .await?;
        }
        Commands::Verify { record } => {
            commands::verify::run(&storage_dir, &config, &record, cli.verbose).await?;
        }
        Commands::Serve { bind } => {
            let config = match bind {
                Some(bind) => config.with_bind(bind),
                None => config,
            };
            commands::serve::run(&storage_dir, &config, cli.verbose).await?;
        }
    }

    Ok(())
}
