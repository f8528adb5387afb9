//! Node group scaler daemon
//!
//! Reconciles managed Kubernetes node groups against the control plane:
//! periodically refreshes the cached group set and exposes health and
//! Prometheus metrics endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use scaler_lib::remote::ControlPlaneClient;
use scaler_lib::{Manager, ScalerConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("starting nodegroup-scaler");

    let daemon_config = config::DaemonConfig::load()?;
    let scaler_config =
        ScalerConfig::load().context("control plane configuration is incomplete")?;
    let cluster_id = scaler_config.parsed_cluster_id()?;
    let specs = scaler_config.node_group_specs()?;
    info!(cluster = %cluster_id, static_specs = specs.len(), "scaler configured");

    let client = ControlPlaneClient::new(
        &scaler_config.api_url,
        &scaler_config.username,
        &scaler_config.password,
    )
    .context("failed to build control plane client")?;
    let manager = Arc::new(Manager::new(Arc::new(client), cluster_id, specs));

    let state = Arc::new(api::AppState::new());
    let api_handle = tokio::spawn(api::serve(daemon_config.api_port, Arc::clone(&state)));

    let refresh_handle = tokio::spawn(run_refresh_loop(
        Arc::clone(&manager),
        Arc::clone(&state),
        Duration::from_secs(daemon_config.refresh_interval_secs),
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    refresh_handle.abort();
    api_handle.abort();

    Ok(())
}

/// Refreshes the node group registry on a fixed interval.
///
/// The daemon reports ready once the first refresh succeeds; later
/// failures are logged and retried on the next tick, leaving the last
/// good cache in place.
async fn run_refresh_loop(manager: Arc<Manager>, state: Arc<api::AppState>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match manager.refresh().await {
            Ok(()) => state.set_ready(true),
            Err(err) => error!(error = %err, "refresh failed"),
        }
    }
}
