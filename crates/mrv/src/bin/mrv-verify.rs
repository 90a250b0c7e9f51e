//! Verify a local MRV record file against the ledger.
//!
//! Exit codes: 0 valid, 1 usage or unreadable file, 2 tampered,
//! 3 not found, 4 not connected.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use mrv::ledger::{LedgerClient, LedgerConfig};
use mrv::{init_logging, Verifier};

/// Verify an MRV record against its on-chain anchor
#[derive(Parser)]
#[command(name = "mrv-verify")]
#[command(version)]
#[command(after_help = "Example:\n  mrv-verify MRV-abc123 mrv_data/MRV-abc123.json")]
struct Cli {
    /// Record id the anchor was registered under
    id: String,

    /// Path to the record JSON file
    file: PathBuf,

    /// Ledger JSON-RPC endpoint (overrides BLOCKCHAIN_RPC_URL)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Registry contract address (overrides CONTRACT_ADDRESS)
    #[arg(long)]
    contract_address: Option<String>,
}

fn run(cli: Cli) -> Result<u8> {
    let mut config = LedgerConfig::from_env();
    if let Some(url) = cli.rpc_url {
        config = config.with_rpc_url(url);
    }
    if let Some(address) = cli.contract_address {
        config = config.with_contract_address(address);
    }

    let ledger = LedgerClient::http(config).context("invalid ledger configuration")?;
    let report = Verifier::new(ledger)
        .verify_file(&cli.id, &cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    println!("{}", report);
    Ok(report.outcome.exit_code())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
