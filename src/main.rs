// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Web Scan Worker
 * Runs one assessment against a target and prints the stored result
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use webscan_engine::config::{AppConfig, ObservabilityConfig};
use webscan_engine::database::PostgresScanStore;
use webscan_engine::engine::{ScanEngine, ScanOutcome};
use webscan_engine::http_client::HttpClient;
use webscan_engine::service::{CreateScanRequest, ScanService};
use webscan_engine::store::{MemoryStore, ScanStore};
use webscan_engine::tls_inspector::RustlsProbe;
use webscan_engine::types::ScanMode;
use webscan_engine::worker::ScanExecutor;

#[derive(Parser, Debug)]
#[command(name = "webscan-worker", version, about = "Web security assessment worker")]
struct Args {
    /// Target URL (http or https)
    #[arg(short, long)]
    target: String,

    /// quick or comprehensive
    #[arg(short, long, default_value = "quick")]
    mode: ScanMode,

    #[arg(short, long, default_value = "cli scan")]
    name: String,

    #[arg(long)]
    owner: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::from_env()?;

    init_tracing(&config.observability);

    info!("Web Scan Worker v{} - Starting", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("webscan-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, config))
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    if observability.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn ScanStore>> {
    if !config.database.enabled {
        warn!("DATABASE_URL not set, results are kept in memory for this run only");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PostgresScanStore::connect(&config.database).await?;
    if config.database.auto_migrate {
        store.init_schema().await?;
    }
    Ok(Arc::new(store))
}

async fn async_main(args: Args, config: AppConfig) -> Result<()> {
    let store = open_store(&config).await?;

    let scanner = &config.scanner;
    let http_client = HttpClient::with_config(
        scanner.request_timeout_secs,
        scanner.max_redirects,
        scanner.user_agent.as_deref(),
        scanner.accept_invalid_certs,
    )?
    .with_global_limit(Arc::new(Semaphore::new(scanner.max_requests_in_flight)));

    let engine = ScanEngine::new(
        scanner.clone(),
        Arc::new(http_client),
        Arc::clone(&store),
        Arc::new(RustlsProbe::new()),
    );
    let executor = Arc::new(ScanExecutor::new(Arc::new(engine), scanner.max_concurrent_scans));
    let service = ScanService::new(store, executor);

    let (scan, handle) = service
        .start_scan(CreateScanRequest {
            name: args.name,
            target_url: args.target,
            scan_type: args.mode,
            owner_id: args.owner,
        })
        .await
        .context("Failed to start scan")?;

    let token = handle.token.clone();
    let join = handle.join();
    tokio::pin!(join);

    let outcome = tokio::select! {
        outcome = &mut join => outcome,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received, cancelling scan {}", scan.id);
            token.cancel();
            if let Err(e) = service.cancel_scan(&scan.id).await {
                warn!("Cancel of scan {} not recorded: {}", scan.id, e);
            }
            join.await
        }
    };

    match &outcome {
        ScanOutcome::Completed { total } => {
            info!("[SUCCESS] Scan {} completed with {} findings", scan.id, total)
        }
        ScanOutcome::Failed { reason } => error!("Scan {} failed: {}", scan.id, reason),
        ScanOutcome::Cancelled => info!("Scan {} cancelled", scan.id),
        ScanOutcome::Skipped => warn!("Scan {} was not run", scan.id),
    }

    if let Some(details) = service.get_scan(&scan.id).await? {
        println!("{}", serde_json::to_string_pretty(&details)?);
    }

    if matches!(outcome, ScanOutcome::Failed { .. }) {
        std::process::exit(1);
    }

    Ok(())
}
