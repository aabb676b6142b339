//! Outcome of a single endpoint probe.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classified result of one health-check request against a bot.
///
/// Probers never fail; every transport or protocol fault is folded into a
/// result with `ok == false` and a detail message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    ok: bool,
    latency: Duration,
    http_status: Option<u16>,
    error_detail: Option<String>,
}

impl ProbeResult {
    /// Creates a successful result for a response with the given status code.
    #[must_use]
    pub const fn success(latency: Duration, http_status: u16) -> Self {
        Self {
            ok: true,
            latency,
            http_status: Some(http_status),
            error_detail: None,
        }
    }

    /// Creates a failed result with an explanatory detail.
    #[must_use]
    pub fn failure(latency: Duration, detail: impl Into<String>) -> Self {
        let normalized = detail.into().trim().to_owned();
        Self {
            ok: false,
            latency,
            http_status: None,
            error_detail: Some(if normalized.is_empty() {
                String::from("probe failed")
            } else {
                normalized
            }),
        }
    }

    /// Records the status code of a response that was classified as a
    /// failure.
    #[must_use]
    pub const fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    /// Returns whether the probe succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns the time spent on the probe.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns the HTTP status code, if a response was received.
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Returns the failure detail, if the probe failed.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}
