//! The long-running monitor loop: sweep, sleep, repeat.

use super::sweep::{BotSweepService, SweepReport, shutdown_requested};
use crate::bot::{
    domain::BotStatus,
    ports::{BotRepository, EndpointProber},
};
use mockable::Clock;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Default pause between the end of one sweep and the start of the next.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Why the monitor loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExitReason {
    /// The shutdown signal was raised.
    Shutdown,
    /// The configured number of sweeps has run.
    SweepLimitReached,
}

/// Summary of a monitor loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Sweeps started, including skipped ones.
    pub sweeps: u64,
    /// Sweeps skipped because the bot listing failed.
    pub skipped_sweeps: u64,
    /// Why the loop returned.
    pub reason: MonitorExitReason,
}

/// Repeats sweeps at a fixed interval until shutdown.
pub struct MonitorLoop<R, P, C>
where
    R: BotRepository,
    P: EndpointProber,
    C: Clock + Send + Sync,
{
    sweeper: BotSweepService<R, P, C>,
    interval: Duration,
    max_sweeps: Option<u64>,
}

impl<R, P, C> MonitorLoop<R, P, C>
where
    R: BotRepository + 'static,
    P: EndpointProber + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a loop that runs until shutdown.
    #[must_use]
    pub const fn new(sweeper: BotSweepService<R, P, C>, interval: Duration) -> Self {
        Self {
            sweeper,
            interval,
            max_sweeps: None,
        }
    }

    /// Stops the loop after `max_sweeps` sweeps.
    #[must_use]
    pub const fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    /// Runs sweeps until shutdown or the sweep limit.
    ///
    /// A failed bot listing skips that sweep; the loop sleeps and tries again.
    /// The interval is measured from the end of one sweep to the start of the
    /// next. Shutdown during the sleep returns immediately.
    pub async fn run(&self, shutdown: &watch::Receiver<bool>) -> MonitorSummary {
        let mut stop = shutdown.clone();
        let mut sweeps = 0_u64;
        let mut skipped_sweeps = 0_u64;
        let finish = |completed, skipped, reason| MonitorSummary {
            sweeps: completed,
            skipped_sweeps: skipped,
            reason,
        };

        info!(
            interval_secs = self.interval.as_secs(),
            threshold = %self.sweeper.threshold(),
            concurrency = self.sweeper.concurrency(),
            "monitor loop started"
        );

        loop {
            if *shutdown.borrow() {
                return finish(sweeps, skipped_sweeps, MonitorExitReason::Shutdown);
            }

            sweeps += 1;
            match self.sweeper.run_sweep(shutdown).await {
                Ok(report) => self.log_sweep(sweeps, &report).await,
                Err(err) => {
                    skipped_sweeps += 1;
                    warn!(sweep = sweeps, error = %err, "failed to list bots, sweep skipped");
                }
            }

            if self.max_sweeps.is_some_and(|limit| sweeps >= limit) {
                return finish(sweeps, skipped_sweeps, MonitorExitReason::SweepLimitReached);
            }

            tokio::select! {
                () = shutdown_requested(&mut stop) => {
                    return finish(sweeps, skipped_sweeps, MonitorExitReason::Shutdown);
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    async fn log_sweep(&self, sweep: u64, report: &SweepReport) {
        info!(
            sweep,
            probed = report.probed,
            healthy = report.healthy,
            degraded = report.degraded,
            down = report.down,
            vanished = report.vanished,
            write_failures = report.write_failures,
            interrupted = report.interrupted,
            elapsed_ms = report.elapsed.as_millis(),
            "sweep finished"
        );

        if report.interrupted {
            return;
        }

        match self.sweeper.fleet_stats().await {
            Ok(stats) => info!(
                total = stats.total(),
                unknown = stats.count(BotStatus::Unknown),
                healthy = stats.count(BotStatus::Healthy),
                degraded = stats.count(BotStatus::Degraded),
                down = stats.count(BotStatus::Down),
                total_failures = stats.total_failures(),
                last_update = ?stats.last_update(),
                "fleet statistics"
            ),
            Err(err) => warn!(error = %err, "failed to read fleet statistics"),
        }
    }
}
