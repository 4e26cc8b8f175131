//! Video split worker binary.
//!
//! Runs a single split job read from the JSON file named by the first
//! argument (or stdin when absent or `-`) and prints the outcome as JSON.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsplit_storage::R2Client;
use vsplit_worker::{read_job, SplitJobRunner, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    info!("Starting vsplit-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let input = std::env::args().nth(1).filter(|a| a != "-").map(PathBuf::from);
    let job = read_job(input.as_deref())
        .await
        .context("Failed to read split job")?;

    let storage = R2Client::from_env()
        .await
        .context("Failed to create R2 client")?;

    let runner = SplitJobRunner::from_config(&config, storage)?;
    let outcome = runner.run(job).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.is_completed() {
        error!("Split job failed");
        std::process::exit(1);
    }
    Ok(())
}

/// Colored output for dev, JSON for production (`LOG_FORMAT=json`).
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vsplit=info".parse()?)
        .add_directive("aws_config=warn".parse()?);

    // Logs go to stderr so stdout carries only the outcome.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}
