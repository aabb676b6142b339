//! HTTP endpoint prober backed by `reqwest`.

use crate::bot::{
    domain::{ProbeResult, RedirectUrl},
    ports::EndpointProber,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect};
use std::error::Error as _;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("bot-monitor/", env!("CARGO_PKG_VERSION"));

/// Error returned when the HTTP client cannot be constructed.
#[derive(Debug, Error)]
#[error("failed to build HTTP probe client: {0}")]
pub struct HttpProberBuildError(#[source] reqwest::Error);

/// Probes bot endpoints with a single `GET` request.
///
/// Redirects are not followed, so a `3xx` answer from the redirect endpoint
/// counts as success alongside `2xx`. Every request is bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct HttpEndpointProber {
    client: Client,
    timeout: Duration,
}

impl HttpEndpointProber {
    /// Creates a prober with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProberBuildError`] when the TLS backend or client
    /// configuration cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, HttpProberBuildError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()
            .map_err(HttpProberBuildError)?;
        Ok(Self { client, timeout })
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self, latency: Duration) -> ProbeResult {
        ProbeResult::failure(
            latency,
            format!("timed out after {}ms", self.timeout.as_millis()),
        )
    }
}

#[async_trait]
impl EndpointProber for HttpEndpointProber {
    async fn probe(&self, redirect_url: &RedirectUrl) -> ProbeResult {
        let started = Instant::now();
        // The client timeout covers the request; the outer bound also covers
        // DNS resolution stalls inside the connector.
        let outcome = tokio::time::timeout(
            self.timeout,
            self.client.get(redirect_url.as_str()).send(),
        )
        .await;
        let latency = started.elapsed();

        let result = match outcome {
            Err(_) => self.timed_out(latency),
            Ok(Err(err)) if err.is_timeout() => self.timed_out(latency),
            Ok(Err(err)) => ProbeResult::failure(latency, describe_error(&err)),
            Ok(Ok(response)) => classify_status(response.status(), latency),
        };

        if let Some(detail) = result.error_detail() {
            debug!(url = %redirect_url, latency_ms = latency.as_millis(), %detail, "probe failed");
        } else {
            debug!(url = %redirect_url, latency_ms = latency.as_millis(), "probe succeeded");
        }
        result
    }
}

fn classify_status(status: StatusCode, latency: Duration) -> ProbeResult {
    let code = status.as_u16();
    if status.is_success() || status.is_redirection() {
        ProbeResult::success(latency, code)
    } else {
        ProbeResult::failure(latency, format!("HTTP {code}")).with_http_status(code)
    }
}

fn describe_error(err: &reqwest::Error) -> String {
    let prefix = if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    let mut detail = format!("{prefix}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
