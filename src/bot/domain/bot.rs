//! Bot aggregate root and the probe state-transition policy.

use super::{BotId, BotName, BotStatus, DegradedThreshold, ProbeResult, RedirectUrl};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Monitored redirect endpoint aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    id: BotId,
    name: BotName,
    redirect_url: RedirectUrl,
    status: BotStatus,
    failures: u32,
    last_ok: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_http_status: Option<u16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted bot state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBotData {
    /// Persisted bot identifier.
    pub id: BotId,
    /// Persisted bot name.
    pub name: BotName,
    /// Persisted redirect URL.
    pub redirect_url: RedirectUrl,
    /// Persisted health status.
    pub status: BotStatus,
    /// Persisted consecutive-failure counter.
    pub failures: u32,
    /// Persisted timestamp of the last successful probe.
    pub last_ok: Option<DateTime<Utc>>,
    /// Persisted detail of the last failed probe.
    pub last_error: Option<String>,
    /// Persisted HTTP status observed by the last probe.
    pub last_http_status: Option<u16>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Monitor-owned columns of a bot row, written atomically per bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotHealthUpdate {
    /// Bot being updated.
    pub id: BotId,
    /// New health status.
    pub status: BotStatus,
    /// New consecutive-failure counter.
    pub failures: u32,
    /// Timestamp of the last successful probe.
    pub last_ok: Option<DateTime<Utc>>,
    /// Detail of the last failed probe, cleared on success.
    pub last_error: Option<String>,
    /// HTTP status observed by the probe, if any.
    pub last_http_status: Option<u16>,
    /// Row modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Bot {
    /// Creates a new, not yet probed bot.
    #[must_use]
    pub fn new(name: BotName, redirect_url: RedirectUrl, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: BotId::new(),
            name,
            redirect_url,
            status: BotStatus::Unknown,
            failures: 0,
            last_ok: None,
            last_error: None,
            last_http_status: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a bot from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedBotData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            redirect_url: data.redirect_url,
            status: data.status,
            failures: data.failures,
            last_ok: data.last_ok,
            last_error: data.last_error,
            last_http_status: data.last_http_status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the bot identifier.
    #[must_use]
    pub const fn id(&self) -> BotId {
        self.id
    }

    /// Returns the bot name.
    #[must_use]
    pub const fn name(&self) -> &BotName {
        &self.name
    }

    /// Returns the monitored redirect URL.
    #[must_use]
    pub const fn redirect_url(&self) -> &RedirectUrl {
        &self.redirect_url
    }

    /// Returns the health status.
    #[must_use]
    pub const fn status(&self) -> BotStatus {
        self.status
    }

    /// Returns the consecutive-failure counter.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Returns the timestamp of the last successful probe.
    #[must_use]
    pub const fn last_ok(&self) -> Option<DateTime<Utc>> {
        self.last_ok
    }

    /// Returns the detail of the last failed probe.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the HTTP status observed by the last probe.
    #[must_use]
    pub const fn last_http_status(&self) -> Option<u16> {
        self.last_http_status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Folds a probe result into the bot and returns the row update to
    /// persist.
    ///
    /// A success marks the bot healthy, clears the failure counter, and
    /// advances `last_ok`. A failure increments the counter and reports the
    /// bot degraded while the counter is within `threshold`, down beyond it.
    pub fn record_probe(
        &mut self,
        result: &ProbeResult,
        threshold: DegradedThreshold,
        clock: &impl Clock,
    ) -> BotHealthUpdate {
        let now = clock.utc();

        if result.is_ok() {
            self.status = BotStatus::Healthy;
            self.failures = 0;
            self.last_ok = Some(self.last_ok.map_or(now, |previous| previous.max(now)));
            self.last_error = None;
        } else {
            self.failures = self.failures.saturating_add(1);
            self.status = threshold.status_after_failures(self.failures);
            self.last_error = result.error_detail().map(str::to_owned);
        }

        self.last_http_status = result.http_status();
        self.touch(now);
        self.health_update()
    }

    /// Returns the monitor-owned columns in their current state.
    #[must_use]
    pub fn health_update(&self) -> BotHealthUpdate {
        BotHealthUpdate {
            id: self.id,
            status: self.status,
            failures: self.failures,
            last_ok: self.last_ok,
            last_error: self.last_error.clone(),
            last_http_status: self.last_http_status,
            updated_at: self.updated_at,
        }
    }

    /// Overwrites the monitor-owned columns from a persisted update.
    pub(crate) fn apply_health_update(&mut self, update: &BotHealthUpdate) {
        self.status = update.status;
        self.failures = update.failures;
        self.last_ok = update.last_ok;
        self.last_error.clone_from(&update.last_error);
        self.last_http_status = update.last_http_status;
        self.updated_at = update.updated_at.max(self.created_at);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}
