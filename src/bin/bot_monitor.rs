//! Runs the bot health monitor as a foreground process.
//!
//! ```text
//! DATABASE_URL=postgres://monitor@localhost/bots bot-monitor --sweep-interval-secs 30
//! ```
//!
//! Every flag also reads a `BOT_MONITOR_*` environment variable; see
//! `bot-monitor --help`. SIGINT and SIGTERM stop the monitor after in-flight
//! probes finish.

use anyhow::Context;
use bot_monitor::{
    config::{MonitorConfig, MonitorSettings},
    runtime::run_monitor,
    supervisor::supervise,
};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,bot_monitor=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = MonitorSettings::parse();
    init_tracing(settings.log_json);

    let config = MonitorConfig::try_from(settings).context("invalid monitor configuration")?;
    info!(?config, "bot monitor starting");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        if shutdown_tx.send(true).is_err() {
            warn!("monitor already stopped");
        }
    });

    let summary = supervise(config.restart_policy(), &shutdown_rx, || {
        run_monitor(&config, &shutdown_rx)
    })
    .await
    .context("bot monitor stopped")?;

    info!(
        sweeps = summary.sweeps,
        skipped_sweeps = summary.skipped_sweeps,
        reason = ?summary.reason,
        "bot monitor stopped"
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "cannot listen for SIGTERM, only SIGINT stops the monitor");
            let _interrupt = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _interrupt = tokio::signal::ctrl_c().await;
}
