//! invoice-anchor
//!
//! Anchors an invoice commitment on an EVM-compatible registry contract and
//! verifies anchored invoices.
//!
//! # Commands
//! - `submit`: identity, allow-list, uniqueness, submit, classify
//! - `verify <CODE>...`: look up invoice codes
//! - `status`: endpoint, registry and signer preflight
//!
//! Exit status is zero only after a confirmed and re-verified anchor (or a
//! successful read-only command). Each failure category has its own code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use invoice_anchor::anchor::fees::format_gwei;
use invoice_anchor::anchor::inspect::{status, verify};
use invoice_anchor::anchor::{
    execute, parse_address, prepare, report_failure, AnchorError, RunSettings, SecretKey,
};
use invoice_anchor::chain::{InvoiceCache, InvoiceRegistry, RpcLedger};
use invoice_anchor::config::{load_config, load_from_env, AnchorConfig, ObservabilityConfig};
use invoice_anchor::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "invoice-anchor", version)]
#[command(about = "Anchor invoice commitments on an on-chain registry", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long, env = "ANCHOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, submit and verify one invoice anchor
    Submit,
    /// Look up invoice codes (INV-XXXX-XXXX, XXXX-XXXX or 8 characters)
    Verify {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Show endpoint, registry and signer status
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            // No usable observability section; log with defaults.
            init_logging(&ObservabilityConfig::default());
            return fail(AnchorError::Config(e.to_string()));
        }
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "invoice-anchor starting");

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(e: AnchorError) -> ExitCode {
    report_failure(&e);
    eprintln!("Error [{}]: {}", e.category(), e);
    ExitCode::from(e.exit_code())
}

async fn run(command: Commands, config: &AnchorConfig) -> Result<(), AnchorError> {
    match command {
        Commands::Submit => {
            let settings = RunSettings::from_config(config)?;
            let key = SecretKey::from_env(&config.signer.private_key_env)?;
            let identity = prepare(&settings, &key)?;
            drop(key);

            let ledger = RpcLedger::connect(&config.ledger).await?;
            let mut rng = StdRng::from_entropy();
            let report = execute(&ledger, &settings, &identity, &mut rng).await?;

            println!("Invoice anchored");
            println!("  human id:       {}", report.candidate.human_id);
            println!("  content hash:   {}", report.candidate.content_hash);
            println!("  transaction:    {}", report.receipt.transaction_id);
            println!("  block:          {}", report.receipt.block_number);
            println!("  gas used:       {}", report.receipt.gas_used);
            println!(
                "  gas price:      {} gwei",
                format_gwei(report.receipt.effective_gas_price)
            );
        }
        Commands::Verify { codes } => {
            let contract = parse_address("contract.address", &config.contract.address)?;
            let ledger = RpcLedger::connect(&config.ledger).await?;
            let registry = InvoiceRegistry::new(&ledger, contract);
            let cache = InvoiceCache::new(Duration::from_secs(config.cache.ttl_secs));

            let mut results = Vec::with_capacity(codes.len());
            for code in &codes {
                results.push(verify(&registry, &cache, code).await?);
            }
            print_json(&results)?;
        }
        Commands::Status => {
            let settings = RunSettings::from_config(config)?;
            let key = SecretKey::from_env(&config.signer.private_key_env).ok();
            let ledger = RpcLedger::connect(&config.ledger).await?;
            let report = status(
                &ledger,
                &settings,
                key.as_ref(),
                config.ledger.native_decimals,
            )
            .await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AnchorError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AnchorError::Config(format!("cannot render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
