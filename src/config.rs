//! Runtime configuration for the bot monitor.
//!
//! Settings are read from command-line flags, each of which falls back to an
//! environment variable and then to a default. [`MonitorSettings`] is the raw
//! parsed form; [`MonitorConfig`] is the validated form the rest of the crate
//! consumes.

use crate::bot::domain::DegradedThreshold;
use crate::supervisor::RestartPolicy;
use clap::Parser;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Raw settings as parsed from flags and environment variables.
#[derive(Clone, PartialEq, Eq, Parser)]
#[command(name = "bot-monitor", version, about = "Continuous health monitor for redirect bots")]
pub struct MonitorSettings {
    /// `PostgreSQL` connection URL of the bot store.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Seconds to sleep between sweeps.
    #[arg(long, env = "BOT_MONITOR_SWEEP_INTERVAL_SECS", default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Hard timeout of a single probe, in seconds.
    #[arg(long, env = "BOT_MONITOR_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    pub probe_timeout_secs: u64,

    /// Consecutive failures up to which a bot is degraded rather than down.
    #[arg(long, env = "BOT_MONITOR_DEGRADED_THRESHOLD", default_value_t = DegradedThreshold::DEFAULT.value())]
    pub degraded_threshold: u32,

    /// Maximum number of probes in flight during a sweep.
    #[arg(long, env = "BOT_MONITOR_PROBE_CONCURRENCY", default_value_t = 8)]
    pub probe_concurrency: usize,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "BOT_MONITOR_POOL_SIZE", default_value_t = 4)]
    pub pool_size: u32,

    /// Seconds to wait before restarting after a fatal error.
    #[arg(long, env = "BOT_MONITOR_RESTART_DELAY_SECS", default_value_t = 5)]
    pub restart_delay_secs: u64,

    /// Give up after this many restarts. Unlimited when omitted.
    #[arg(long, env = "BOT_MONITOR_MAX_RESTARTS")]
    pub max_restarts: Option<u32>,

    /// Run a single sweep and exit.
    #[arg(long, env = "BOT_MONITOR_ONCE")]
    pub once: bool,

    /// Emit logs as JSON lines.
    #[arg(long, env = "BOT_MONITOR_LOG_JSON")]
    pub log_json: bool,
}

impl fmt::Debug for MonitorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorSettings")
            .field("database_url", &"<redacted>")
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("degraded_threshold", &self.degraded_threshold)
            .field("probe_concurrency", &self.probe_concurrency)
            .field("pool_size", &self.pool_size)
            .field("restart_delay_secs", &self.restart_delay_secs)
            .field("max_restarts", &self.max_restarts)
            .field("once", &self.once)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The database URL is blank.
    #[error("database URL must not be empty")]
    EmptyDatabaseUrl,

    /// A duration or count that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validated monitor configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    database_url: String,
    sweep_interval: Duration,
    probe_timeout: Duration,
    threshold: DegradedThreshold,
    probe_concurrency: usize,
    pool_size: u32,
    restart_policy: RestartPolicy,
    once: bool,
}

impl fmt::Debug for MonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorConfig")
            .field("database_url", &"<redacted>")
            .field("sweep_interval", &self.sweep_interval)
            .field("probe_timeout", &self.probe_timeout)
            .field("threshold", &self.threshold)
            .field("probe_concurrency", &self.probe_concurrency)
            .field("pool_size", &self.pool_size)
            .field("restart_policy", &self.restart_policy)
            .field("once", &self.once)
            .finish()
    }
}

impl TryFrom<MonitorSettings> for MonitorConfig {
    type Error = ConfigError;

    fn try_from(settings: MonitorSettings) -> Result<Self, Self::Error> {
        let database_url = settings.database_url.trim().to_owned();
        if database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        Ok(Self {
            database_url,
            sweep_interval: Duration::from_secs(non_zero(
                settings.sweep_interval_secs,
                "sweep interval",
            )?),
            probe_timeout: Duration::from_secs(non_zero(
                settings.probe_timeout_secs,
                "probe timeout",
            )?),
            threshold: DegradedThreshold::new(settings.degraded_threshold),
            probe_concurrency: non_zero(settings.probe_concurrency, "probe concurrency")?,
            pool_size: non_zero(settings.pool_size, "pool size")?,
            restart_policy: RestartPolicy::new(Duration::from_secs(settings.restart_delay_secs))
                .with_max_restarts(settings.max_restarts),
            once: settings.once,
        })
    }
}

fn non_zero<T>(value: T, setting: &'static str) -> Result<T, ConfigError>
where
    T: Default + PartialEq,
{
    if value == T::default() {
        Err(ConfigError::Zero(setting))
    } else {
        Ok(value)
    }
}

impl MonitorConfig {
    /// Returns the database connection URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Returns the pause between sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Returns the hard timeout of one probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Returns the degraded threshold.
    #[must_use]
    pub const fn threshold(&self) -> DegradedThreshold {
        self.threshold
    }

    /// Returns the probe concurrency limit.
    #[must_use]
    pub const fn probe_concurrency(&self) -> usize {
        self.probe_concurrency
    }

    /// Returns the connection pool size.
    #[must_use]
    pub const fn pool_size(&self) -> u32 {
        self.pool_size
    }

    /// Returns the restart policy.
    #[must_use]
    pub const fn restart_policy(&self) -> &RestartPolicy {
        &self.restart_policy
    }

    /// Returns whether a single sweep should run.
    #[must_use]
    pub const fn once(&self) -> bool {
        self.once
    }
}
