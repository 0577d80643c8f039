//! meal-sw server entry point.
//!
//! This is the host shim: it boots logging and configuration, constructs the
//! worker once, runs install and activate, then serves the worker's fetch path
//! and control protocol as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use mealsw_client::fetch::resolve;
use mealsw_client::{EvictionPolicy, FetchConfig, Host, HttpNetwork, Network, Worker, WorkerConfig};
use mealsw_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin_url()?;
    tracing::info!(origin = %origin, db = %config.db_path.display(), version = %config.version, "Starting meal-sw");

    let db = CacheDb::open(&config.db_path).await?;
    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    };
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(origin.clone(), fetch_config)?);

    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let script_url = resolve(&origin, &config.script_path)?;
    let host = Arc::new(host::LocalHost::new(network.clone(), script_url, updates_tx));
    let worker = Worker::new(worker_config(&config, origin), db, network, host.clone())?;

    run_lifecycle(&worker).await;
    tracing::info!(skipped_waiting = host.skipped_waiting(), state = worker.state().await.as_str(), "worker ready");

    // Seed the update baseline so the first poll can detect a change.
    if let Err(e) = host.check_for_update().await {
        tracing::warn!(error = %e, "could not read worker definition");
    }

    let reinstaller = tokio::spawn({
        let worker = worker.clone();
        async move {
            while updates_rx.recv().await.is_some() {
                tracing::info!("running fresh install/activate cycle");
                run_lifecycle(&worker).await;
            }
        }
    });

    let handler = handler::MealSwServer::new(worker.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    reinstaller.abort();
    worker.shutdown().await;

    Ok(())
}

fn worker_config(config: &AppConfig, origin: Url) -> WorkerConfig {
    WorkerConfig {
        names: config.cache_names(),
        offline_document: config.offline_document.clone(),
        eviction: EvictionPolicy { max_entries: config.max_entries, evict_count: config.evict_count },
        sweep_interval: config.sweep_interval(),
        update_interval: config.update_interval(),
        ..WorkerConfig::new(origin)
    }
}

/// Install then activate. A failed install is logged and activation still
/// runs; the static partition keeps whatever was fetched.
async fn run_lifecycle(worker: &Worker) {
    if let Err(e) = worker.on_install().await {
        tracing::error!(error = %e, "install did not complete");
    }
    match worker.on_activate().await {
        Ok(deleted) => tracing::info!(deleted = ?deleted, "activation complete"),
        Err(e) => tracing::error!(error = %e, "activation failed"),
    }
}
