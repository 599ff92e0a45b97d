//! SitePulse -- periodic HTTP uptime probe with an in-memory history.
//!
//! One target is probed on a cron schedule and on demand. Results are kept
//! in a bounded history and exposed, together with aggregate health
//! statistics, through a small JSON API.

pub mod api;
pub mod config;
pub mod probes;
pub mod scheduler;
pub mod storage;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::probes::{http::HttpProbe, ProbeResult};
use crate::scheduler::Monitor;
use crate::storage::HistoryStore;

/// Wire the HTTP probe and a fresh history store into a [`Monitor`].
pub fn build_monitor(config: &MonitorConfig) -> Result<Monitor> {
    let probe = HttpProbe::new()?;
    let store = HistoryStore::with_capacity(config.schedule.history_capacity);
    Ok(Monitor::new(
        Arc::new(probe),
        store,
        config.target.url.clone(),
        config.target.timeout(),
    ))
}

/// Start the long-running service: API server plus scheduler.
pub async fn serve(config: MonitorConfig) -> Result<()> {
    let schedule = config.schedule.parse()?;
    let monitor = build_monitor(&config)?;

    // Scheduler engine (background task)
    tokio::spawn(scheduler::run_scheduler_loop(
        monitor.clone(),
        schedule,
        config.schedule.initial_delay(),
    ));

    let state = api::state::AppState::new(
        monitor,
        config.server.check_secret.clone(),
        describe_schedule(&config.schedule.cron),
    );
    let app = api::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        %addr,
        target_url = %config.target.url,
        auth = config.server.check_secret.is_some(),
        "SitePulse listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Single-shot mode for externally scheduled deployments: probe once.
///
/// Nothing is retained between invocations, so the result is only returned.
pub async fn check_once(config: &MonitorConfig, url: Option<&str>) -> Result<ProbeResult> {
    let monitor = build_monitor(config)?;
    tracing::info!("Running scheduled website check");
    Ok(monitor.check(url).await)
}

/// Short description of a cron expression for the info endpoint.
pub fn describe_schedule(expr: &str) -> String {
    match expr.trim() {
        "0 * * * * *" | "0 * * * * * *" => "Every minute".to_string(),
        other => format!("cron: {}", other),
    }
}
