//! Composition root: wires adapters into the monitor loop.

use crate::bot::{
    adapters::{
        HttpEndpointProber,
        postgres::{BotPgPool, PostgresBotRepository},
    },
    services::{BotSweepService, MonitorLoop, MonitorSummary},
};
use crate::config::MonitorConfig;
use crate::supervisor::MonitorError;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Builds the `PostgreSQL` pool for the bot store.
///
/// # Errors
///
/// Returns [`MonitorError::Pool`] when the initial connections cannot be
/// established.
///
/// # Panics
///
/// Re-raises a panic from the blocking pool builder.
pub async fn connect(config: &MonitorConfig) -> Result<BotPgPool, MonitorError> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url());
    let pool_size = config.pool_size();
    let built =
        tokio::task::spawn_blocking(move || Pool::builder().max_size(pool_size).build(manager))
            .await;
    match built {
        Ok(pool) => Ok(pool?),
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}

/// Runs one monitor lifetime against the configured database.
///
/// # Errors
///
/// Returns [`MonitorError`] when the pool or the HTTP client cannot be built,
/// or when a single-sweep run could not read the bot store.
pub async fn run_monitor(
    config: &MonitorConfig,
    shutdown: &watch::Receiver<bool>,
) -> Result<MonitorSummary, MonitorError> {
    let pool = connect(config).await?;
    let prober = HttpEndpointProber::new(config.probe_timeout())?;
    info!(
        pool_size = config.pool_size(),
        probe_timeout_secs = config.probe_timeout().as_secs(),
        "bot store connected"
    );

    let sweeper = BotSweepService::new(
        Arc::new(PostgresBotRepository::new(pool)),
        Arc::new(prober),
        Arc::new(DefaultClock),
    )
    .with_threshold(config.threshold())
    .with_concurrency(config.probe_concurrency());

    let mut monitor = MonitorLoop::new(sweeper, config.sweep_interval());
    if config.once() {
        monitor = monitor.with_max_sweeps(1);
    }

    let summary = monitor.run(shutdown).await;
    if config.once() && summary.skipped_sweeps > 0 {
        return Err(MonitorError::SweepSkipped);
    }
    Ok(summary)
}
