// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ItunesError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{sleep, Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Default iTunes Search API allowance: roughly 20 calls per minute.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;

#[derive(Debug)]
struct RateState {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl RateState {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }
}

/// Token bucket rate limiter shared by every caller of one client.
///
/// The bucket starts full and refills continuously at `requests / per`
/// tokens per second. The state lock is only held while refilling and
/// decrementing; waiting for a token happens outside of it.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    state: Arc<Mutex<RateState>>,
}

impl TokenBucket {
    /// Create a bucket allowing `requests` calls per `per` window.
    pub fn new(requests: u32, per: Duration) -> Self {
        let max_tokens = f64::from(requests.max(1));
        let window = per.as_secs_f64().max(f64::EPSILON);
        Self {
            state: Arc::new(Mutex::new(RateState {
                tokens: max_tokens,
                max_tokens,
                refill_rate: max_tokens / window,
                last_refill: Instant::now(),
            })),
        }
    }

    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }

    fn lock(&self) -> MutexGuard<'_, RateState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock still holds usable data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take one token, waiting for a refill when the bucket is empty.
    ///
    /// Returns [`ItunesError::Cancelled`] as soon as `cancel` fires, including
    /// when it was already cancelled on entry.
    pub async fn take(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(ItunesError::Cancelled);
            }

            let wait = match self.reserve() {
                None => return Ok(()),
                Some(wait) => wait,
            };

            tracing::trace!(target: "itunes", "rate limiting: waiting {:?}", wait);

            tokio::select! {
                _ = cancel.cancelled() => return Err(ItunesError::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }

    /// Take a token without waiting. Returns `false` when the bucket is empty.
    pub fn try_take(&self) -> bool {
        self.reserve().is_none()
    }

    /// Tokens currently available, after accounting for elapsed refill time.
    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        state.refill(Instant::now());
        state.tokens
    }

    /// Refill and try to decrement. `None` means a token was taken,
    /// otherwise the time needed to accumulate the shortfall.
    fn reserve(&self) -> Option<Duration> {
        let mut state = self.lock();
        state.refill(Instant::now());

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return None;
        }

        let shortfall = 1.0 - state.tokens;
        let wait = Duration::try_from_secs_f64(shortfall / state.refill_rate);
        Some(wait.unwrap_or(Duration::MAX))
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}
