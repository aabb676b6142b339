//! Scripted in-memory endpoint prober.

use crate::bot::{
    domain::{ProbeResult, RedirectUrl},
    ports::EndpointProber,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Endpoint prober that replays queued results instead of touching the
/// network.
///
/// Each URL has its own queue of results; a URL with an empty queue gets the
/// default result (`HTTP 200` unless changed). The prober also records how
/// many probes each URL received and the peak number of probes in flight,
/// which makes concurrency limits observable in tests.
#[derive(Debug, Clone)]
pub struct ScriptedEndpointProber {
    state: Arc<Mutex<ScriptedState>>,
    delay: Duration,
}

#[derive(Debug)]
struct ScriptedState {
    scripts: HashMap<RedirectUrl, VecDeque<ProbeResult>>,
    fallback: ProbeResult,
    calls: HashMap<RedirectUrl, usize>,
    in_flight: usize,
    peak_in_flight: usize,
}

impl Default for ScriptedEndpointProber {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEndpointProber {
    /// Creates a prober whose unscripted probes succeed immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                scripts: HashMap::new(),
                fallback: ProbeResult::success(Duration::ZERO, 200),
                calls: HashMap::new(),
                in_flight: 0,
                peak_in_flight: 0,
            })),
            delay: Duration::ZERO,
        }
    }

    /// Makes every probe take `delay` before it resolves.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the result returned for URLs with an empty queue.
    pub fn set_fallback(&self, result: ProbeResult) {
        self.lock().fallback = result;
    }

    /// Queues a result for the next probe of `redirect_url`.
    pub fn push_result(&self, redirect_url: &RedirectUrl, result: ProbeResult) {
        self.lock()
            .scripts
            .entry(redirect_url.clone())
            .or_default()
            .push_back(result);
    }

    /// Queues a successful probe for `redirect_url`.
    pub fn push_success(&self, redirect_url: &RedirectUrl) {
        self.push_result(redirect_url, ProbeResult::success(Duration::ZERO, 200));
    }

    /// Queues a failed probe for `redirect_url`.
    pub fn push_failure(&self, redirect_url: &RedirectUrl, detail: impl Into<String>) {
        self.push_result(redirect_url, ProbeResult::failure(Duration::ZERO, detail));
    }

    /// Returns how many probes `redirect_url` has received.
    #[must_use]
    pub fn probe_count(&self, redirect_url: &RedirectUrl) -> usize {
        self.lock().calls.get(redirect_url).copied().unwrap_or(0)
    }

    /// Returns how many probes have been issued in total.
    #[must_use]
    pub fn total_probes(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Returns the largest number of probes observed in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.lock().peak_in_flight
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, redirect_url: &RedirectUrl) -> ProbeResult {
        let mut state = self.lock();
        *state.calls.entry(redirect_url.clone()).or_default() += 1;
        state.in_flight += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
        let fallback = state.fallback.clone();
        state
            .scripts
            .get_mut(redirect_url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(fallback)
    }

    fn finish(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

#[async_trait]
impl EndpointProber for ScriptedEndpointProber {
    async fn probe(&self, redirect_url: &RedirectUrl) -> ProbeResult {
        let result = self.begin(redirect_url);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finish();
        result
    }
}
