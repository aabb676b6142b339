//! Bot health status and the failure-escalation threshold.

use super::ParseBotStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health status of a monitored bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    /// The bot has not been probed yet.
    Unknown,
    /// The most recent probe succeeded.
    Healthy,
    /// Recent probes failed, but not more than the degraded threshold.
    Degraded,
    /// Consecutive failures exceeded the degraded threshold.
    Down,
}

impl BotStatus {
    /// All statuses in canonical order.
    pub const ALL: [Self; 4] = [Self::Unknown, Self::Healthy, Self::Degraded, Self::Down];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BotStatus {
    type Error = ParseBotStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "healthy" => Ok(Self::Healthy),
            "degraded" => Ok(Self::Degraded),
            "down" => Ok(Self::Down),
            _ => Err(ParseBotStatusError(value.to_owned())),
        }
    }
}

/// Number of consecutive failures a bot may accumulate while still being
/// reported as [`BotStatus::Degraded`].
///
/// One failure past the threshold reports the bot as [`BotStatus::Down`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DegradedThreshold(u32);

impl DegradedThreshold {
    /// Threshold used when none is configured.
    pub const DEFAULT: Self = Self(3);

    /// Creates a threshold.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw threshold value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Status for a bot whose latest probe failed, given its consecutive
    /// failure count including that probe.
    #[must_use]
    pub const fn status_after_failures(self, failures: u32) -> BotStatus {
        if failures <= self.0 {
            BotStatus::Degraded
        } else {
            BotStatus::Down
        }
    }
}

impl Default for DegradedThreshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for DegradedThreshold {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}
