//! Diesel row models for bot persistence.

use super::schema::bots;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for bot records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BotRow {
    /// Internal bot identifier.
    pub id: uuid::Uuid,
    /// Unique bot name.
    pub name: String,
    /// Unique redirect URL.
    pub redirect_url: String,
    /// Health status.
    pub status: String,
    /// Consecutive failed probes.
    pub failures: i32,
    /// Timestamp of the last successful probe.
    pub last_ok: Option<DateTime<Utc>>,
    /// Detail of the last failed probe.
    pub last_error: Option<String>,
    /// HTTP status observed by the last probe.
    pub last_http_status: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for bot records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bots)]
pub struct NewBotRow {
    /// Internal bot identifier.
    pub id: uuid::Uuid,
    /// Unique bot name.
    pub name: String,
    /// Unique redirect URL.
    pub redirect_url: String,
    /// Health status.
    pub status: String,
    /// Consecutive failed probes.
    pub failures: i32,
    /// Timestamp of the last successful probe.
    pub last_ok: Option<DateTime<Utc>>,
    /// Detail of the last failed probe.
    pub last_error: Option<String>,
    /// HTTP status observed by the last probe.
    pub last_http_status: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset for the monitor-owned columns of a bot record.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = bots)]
#[diesel(treat_none_as_null = true)]
pub struct BotHealthChangeset {
    /// Health status.
    pub status: String,
    /// Consecutive failed probes.
    pub failures: i32,
    /// Timestamp of the last successful probe.
    pub last_ok: Option<DateTime<Utc>>,
    /// Detail of the last failed probe.
    pub last_error: Option<String>,
    /// HTTP status observed by the last probe.
    pub last_http_status: Option<i32>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
