//! A single monitoring sweep over every registered bot.

use crate::bot::{
    domain::{Bot, BotFleetStats, BotStatus, DegradedThreshold},
    ports::{BotRepository, BotRepositoryError, BotRepositoryResult, EndpointProber},
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Default number of probes allowed in flight during one sweep.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// Outcome counters for one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bots whose probe completed, whatever happened to the write.
    ///
    /// Equals `healthy + degraded + down + vanished + write_failures`.
    pub probed: usize,
    /// Bots written back as healthy.
    pub healthy: usize,
    /// Bots written back as degraded.
    pub degraded: usize,
    /// Bots written back as down.
    pub down: usize,
    /// Bots deleted between the listing and their update.
    pub vanished: usize,
    /// Bots whose update could not be written.
    pub write_failures: usize,
    /// Whether shutdown stopped the sweep before every bot was dispatched.
    pub interrupted: bool,
    /// Wall-clock duration of the sweep.
    pub elapsed: Duration,
}

impl SweepReport {
    fn record(&mut self, outcome: CheckOutcome) {
        self.probed += 1;
        match outcome {
            CheckOutcome::Updated(BotStatus::Healthy) => self.healthy += 1,
            CheckOutcome::Updated(BotStatus::Degraded) => self.degraded += 1,
            CheckOutcome::Updated(BotStatus::Down) => self.down += 1,
            // A probe never leaves a bot unknown.
            CheckOutcome::Updated(BotStatus::Unknown) => {}
            CheckOutcome::Vanished => self.vanished += 1,
            CheckOutcome::WriteFailed => self.write_failures += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckOutcome {
    Updated(BotStatus),
    Vanished,
    WriteFailed,
}

/// Probes every bot once and writes the resulting health back to the store.
pub struct BotSweepService<R, P, C>
where
    R: BotRepository,
    P: EndpointProber,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    prober: Arc<P>,
    clock: Arc<C>,
    threshold: DegradedThreshold,
    concurrency: usize,
}

impl<R, P, C> Clone for BotSweepService<R, P, C>
where
    R: BotRepository,
    P: EndpointProber,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            prober: Arc::clone(&self.prober),
            clock: Arc::clone(&self.clock),
            threshold: self.threshold,
            concurrency: self.concurrency,
        }
    }
}

impl<R, P, C> BotSweepService<R, P, C>
where
    R: BotRepository + 'static,
    P: EndpointProber + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a sweep service with the default threshold and concurrency.
    #[must_use]
    pub const fn new(repository: Arc<R>, prober: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            repository,
            prober,
            clock,
            threshold: DegradedThreshold::DEFAULT,
            concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }

    /// Sets the failure count up to which a bot is reported degraded.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: DegradedThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of probes in flight. Zero is raised to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Returns the configured degraded threshold.
    #[must_use]
    pub const fn threshold(&self) -> DegradedThreshold {
        self.threshold
    }

    /// Returns the configured probe concurrency.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Reads aggregate statistics for the whole fleet.
    ///
    /// # Errors
    ///
    /// Returns [`BotRepositoryError`] when the store cannot be read.
    pub async fn fleet_stats(&self) -> BotRepositoryResult<BotFleetStats> {
        self.repository.stats().await
    }

    /// Runs one sweep.
    ///
    /// Lists every bot, probes each one at most once with bounded
    /// concurrency, and writes each result back as an independent update.
    /// When `shutdown` turns `true` no further probes are dispatched, but
    /// probes already in flight complete and their updates are written.
    ///
    /// # Errors
    ///
    /// Returns [`BotRepositoryError`] only when the bot listing fails.
    /// Per-bot write failures are counted in the report instead.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from a check task.
    pub async fn run_sweep(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> BotRepositoryResult<SweepReport> {
        let started = Instant::now();
        let bots = self.repository.list_all().await?;
        debug!(bots = bots.len(), "sweep started");

        let mut report = SweepReport::default();
        let mut stop = shutdown.clone();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut seen = HashSet::with_capacity(bots.len());
        let mut tasks = JoinSet::new();

        for bot in bots {
            if !seen.insert(bot.id()) {
                debug!(bot_id = %bot.id(), "duplicate bot in listing, already scheduled");
                continue;
            }

            let acquired = tokio::select! {
                biased;
                () = shutdown_requested(&mut stop) => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = acquired else {
                report.interrupted = true;
                break;
            };

            let repository = Arc::clone(&self.repository);
            let prober = Arc::clone(&self.prober);
            let clock = Arc::clone(&self.clock);
            let threshold = self.threshold;
            tasks.spawn(async move {
                let outcome = check_bot(bot, &*repository, &*prober, &*clock, threshold).await;
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => error!(error = %err, "bot check task was cancelled"),
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }
}

async fn check_bot<R, P, C>(
    mut bot: Bot,
    repository: &R,
    prober: &P,
    clock: &C,
    threshold: DegradedThreshold,
) -> CheckOutcome
where
    R: BotRepository + ?Sized,
    P: EndpointProber + ?Sized,
    C: Clock,
{
    let previous = bot.status();
    let result = prober.probe(bot.redirect_url()).await;
    let update = bot.record_probe(&result, threshold, clock);

    match repository.update_status(&update).await {
        Ok(()) => {
            if update.status == BotStatus::Down && previous != BotStatus::Down {
                warn!(
                    bot_id = %update.id,
                    bot_name = %bot.name(),
                    failures = update.failures,
                    detail = result.error_detail().unwrap_or_default(),
                    "bot is down"
                );
            } else if update.status != previous {
                debug!(
                    bot_id = %update.id,
                    from = %previous,
                    to = %update.status,
                    "bot status changed"
                );
            }
            CheckOutcome::Updated(update.status)
        }
        Err(BotRepositoryError::NotFound(bot_id)) => {
            warn!(%bot_id, "bot disappeared before its status could be written");
            CheckOutcome::Vanished
        }
        Err(err) => {
            error!(bot_id = %update.id, error = %err, "failed to write bot status");
            CheckOutcome::WriteFailed
        }
    }
}

/// Resolves once `shutdown` holds `true`. A dropped sender never resolves.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
