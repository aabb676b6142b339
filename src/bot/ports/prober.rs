//! Endpoint prober port.

use crate::bot::domain::{ProbeResult, RedirectUrl};
use async_trait::async_trait;

/// Health-check contract for a single bot endpoint.
///
/// Implementations are stateless across calls and must not fail: transport
/// and protocol faults are reported through [`ProbeResult::failure`].
#[async_trait]
pub trait EndpointProber: Send + Sync {
    /// Issues one bounded-time request against `redirect_url` and classifies
    /// the outcome.
    async fn probe(&self, redirect_url: &RedirectUrl) -> ProbeResult;
}
