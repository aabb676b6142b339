//! In-process restart supervision for the monitor.

use crate::bot::adapters::HttpProberBuildError;
use diesel::r2d2::PoolError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, warn};

/// Fatal errors that end a monitor run.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The database connection pool could not be built.
    #[error("failed to build database pool: {0}")]
    Pool(#[from] PoolError),

    /// The HTTP probe client could not be built.
    #[error(transparent)]
    HttpClient(#[from] HttpProberBuildError),

    /// A single-sweep run could not list the bots.
    #[error("sweep skipped because the bot store could not be read")]
    SweepSkipped,
}

/// How often and how quickly a failed run is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    max_restarts: Option<u32>,
    delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl RestartPolicy {
    /// Creates a policy with a fixed delay and no restart limit.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            max_restarts: None,
            delay,
        }
    }

    /// Limits the number of restarts. `None` restarts forever.
    #[must_use]
    pub const fn with_max_restarts(mut self, max_restarts: Option<u32>) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Returns the restart limit.
    #[must_use]
    pub const fn max_restarts(&self) -> Option<u32> {
        self.max_restarts
    }

    /// Returns the delay before each restart.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    const fn allows(&self, restarts: u32) -> bool {
        match self.max_restarts {
            Some(limit) => restarts < limit,
            None => true,
        }
    }
}

/// Runs `run` and restarts it after each error according to `policy`.
///
/// Returns the first successful result. Returns the last error when the
/// restart limit is exhausted or when `shutdown` is raised while waiting to
/// restart.
///
/// # Errors
///
/// Propagates the error of the final attempt.
pub async fn supervise<F, Fut, T, E>(
    policy: &RestartPolicy,
    shutdown: &watch::Receiver<bool>,
    mut run: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut stop = shutdown.clone();
    let mut restarts = 0_u32;

    loop {
        let err = match run().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if *stop.borrow() {
            error!(error = %err, "monitor failed during shutdown");
            return Err(err);
        }
        if !policy.allows(restarts) {
            error!(error = %err, restarts, "monitor failed, restart limit reached");
            return Err(err);
        }

        restarts += 1;
        warn!(
            error = %err,
            restart = restarts,
            delay_secs = policy.delay.as_secs(),
            "monitor failed, restarting"
        );

        let interrupted = tokio::select! {
            () = crate::bot::services::shutdown_requested(&mut stop) => true,
            () = tokio::time::sleep(policy.delay) => false,
        };
        if interrupted {
            return Err(err);
        }
    }
}
