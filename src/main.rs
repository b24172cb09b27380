mod args;
mod catalog;
mod client;
mod config;
mod database;
mod error;
mod flies;
mod hooks;
mod materials;
mod memory;
mod metrics;
mod pipeline;
mod reference;
mod rest;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::args::Args;
use crate::client::{Client, Table};
use crate::config::StoreConfig;
use crate::database::Database;
use crate::memory::MemoryClient;
use crate::metrics::LoadReport;
use crate::pipeline::RunOptions;
use crate::reference::load_reference;
use crate::rest::RestClient;

fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();
    init_tracing(&args)?;

    let runtime = configure_runtime()?;
    runtime.block_on(run_seed(&args))
}

fn configure_runtime() -> Result<tokio::runtime::Runtime> {
    // Every stage waits on one request at a time; a single thread is enough.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the tokio runtime")
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("FLYSEED_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn run_seed(args: &Args) -> Result<()> {
    let options = RunOptions {
        batch_size: args.batch_size as usize,
        hook_match: args.hook_match,
    };

    match args.database {
        Database::Rest => {
            let config = StoreConfig::new(args.url.clone(), args.service_key.clone(), args.timeout_secs)
                .context("connection configuration")?;
            let client = RestClient::new(&config).context("failed to build the HTTP client")?;
            seed(&client, args, options).await?;
        }
        Database::Memory => {
            info!("Dry run: seeding an in-memory store");
            let client = MemoryClient::new();
            seed(&client, args, options).await?;

            println!("\nIn-memory row counts:");
            for table in Table::ALL {
                println!("{:<18} {}", table.as_str(), client.row_count(table).await);
            }
        }
    }

    Ok(())
}

async fn seed<C: Client>(client: &C, args: &Args, options: RunOptions) -> Result<LoadReport> {
    let reference = load_reference(&args.input)?;

    if !args.skip_health_check {
        check_store(client).await;
    }

    println!("{}", "=".repeat(60));
    println!("Fly Reference Database Seeding");
    println!("{}", "=".repeat(60));

    let report = pipeline::run(client, &reference, options).await;

    println!("{report}");
    println!("{}", "=".repeat(60));
    if report.total_failed() == 0 {
        println!("✓ Database seeding complete!");
    } else {
        println!(
            "✓ Database seeding complete with {} failed rows (see log above)",
            report.total_failed()
        );
    }
    println!("{}", "=".repeat(60));

    Ok(report)
}

/// Check the store before writing. A failure is only reported: the stages
/// run anyway and each failed write is counted in the report.
async fn check_store<C: Client>(client: &C) -> bool {
    match client.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "backing store health check failed; continuing");
            false
        }
    }
}
