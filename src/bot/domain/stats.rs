//! Aggregate statistics over the monitored bot fleet.

use super::{Bot, BotStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts and totals across every registered bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotFleetStats {
    unknown: u64,
    healthy: u64,
    degraded: u64,
    down: u64,
    total_failures: u64,
    last_update: Option<DateTime<Utc>>,
}

impl BotFleetStats {
    /// Computes statistics from a full bot listing.
    #[must_use]
    pub fn from_bots<'a>(bots: impl IntoIterator<Item = &'a Bot>) -> Self {
        bots.into_iter().fold(Self::default(), |stats, bot| {
            stats.with_group(
                bot.status(),
                1,
                u64::from(bot.failures()),
                Some(bot.updated_at()),
            )
        })
    }

    /// Folds one per-status aggregate group into the statistics.
    #[must_use]
    pub fn with_group(
        mut self,
        status: BotStatus,
        count: u64,
        failures: u64,
        last_update: Option<DateTime<Utc>>,
    ) -> Self {
        let slot = match status {
            BotStatus::Unknown => &mut self.unknown,
            BotStatus::Healthy => &mut self.healthy,
            BotStatus::Degraded => &mut self.degraded,
            BotStatus::Down => &mut self.down,
        };
        *slot = slot.saturating_add(count);
        self.total_failures = self.total_failures.saturating_add(failures);
        self.last_update = self.last_update.max(last_update);
        self
    }

    /// Returns the total number of bots.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.unknown
            .saturating_add(self.healthy)
            .saturating_add(self.degraded)
            .saturating_add(self.down)
    }

    /// Returns the number of bots in the given status.
    #[must_use]
    pub const fn count(&self, status: BotStatus) -> u64 {
        match status {
            BotStatus::Unknown => self.unknown,
            BotStatus::Healthy => self.healthy,
            BotStatus::Degraded => self.degraded,
            BotStatus::Down => self.down,
        }
    }

    /// Returns the sum of consecutive-failure counters across all bots.
    #[must_use]
    pub const fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Returns the most recent `updated_at` across all bots.
    #[must_use]
    pub const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}
