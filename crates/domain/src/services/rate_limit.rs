//! Per-client submission throttle.
//!
//! Each client identity owns one fixed-capacity window. The state is
//! process-local: it resets on restart and is not shared between instances,
//! so behind a load balancer every instance enforces its own budget. Treat it
//! as an abuse deterrent, not a security boundary.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::clock::Clock;

/// Identity used when no network origin could be determined. Every such
/// client shares this one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Capacity and duration of a window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
    /// Tracked-client count above which idle windows are pruned on insert.
    pub max_tracked_clients: usize,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            max_tracked_clients: 10_000,
        }
    }

    pub fn with_max_tracked_clients(mut self, max: usize) -> Self {
        self.max_tracked_clients = max.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    count: u32,
    started_at: DateTime<Utc>,
}

impl RateLimitWindow {
    fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.started_at >= window
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Seconds until the window resets. Zero when allowed.
    pub retry_after_secs: u64,
}

/// Sliding window rate limiter keyed by client identity.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateLimitWindow>>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Records an attempt for `client_id` and decides whether it may proceed.
    ///
    /// A missing or expired window is replaced by a fresh one holding this
    /// attempt. Denied attempts do not increase the count past capacity.
    pub fn allow(&self, client_id: &str) -> RateDecision {
        let now = self.clock.now();
        let max = self.policy.max_requests;
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());

        if windows.len() >= self.policy.max_tracked_clients && !windows.contains_key(client_id) {
            let window = self.policy.window;
            windows.retain(|_, w| !w.is_expired(now, window));
        }

        match windows.get_mut(client_id) {
            Some(w) if !w.is_expired(now, self.policy.window) => {
                if w.count < max {
                    w.count += 1;
                    RateDecision {
                        allowed: true,
                        remaining: max - w.count,
                        retry_after_secs: 0,
                    }
                } else {
                    let resets_at = w.started_at + self.policy.window;
                    RateDecision {
                        allowed: false,
                        remaining: 0,
                        retry_after_secs: seconds_until(now, resets_at),
                    }
                }
            }
            _ => {
                windows.insert(
                    client_id.to_string(),
                    RateLimitWindow {
                        count: 1,
                        started_at: now,
                    },
                );
                RateDecision {
                    allowed: true,
                    remaining: max - 1,
                    retry_after_secs: 0,
                }
            }
        }
    }

    /// Convenience wrapper: `Ok(remaining)` or `Err(retry_after_secs)`.
    pub fn check(&self, client_id: &str) -> Result<u32, u64> {
        let decision = self.allow(client_id);
        if decision.allowed {
            Ok(decision.remaining)
        } else {
            Err(decision.retry_after_secs)
        }
    }

    /// Discards windows idle beyond the window duration. Returns how many
    /// were removed.
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let window = self.policy.window;
        let mut windows = self.windows.lock().unwrap_or_else(|p| p.into_inner());
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(now, window));
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// Whole seconds from `now` until `until`, rounded up, minimum 1.
fn seconds_until(now: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.policy.max_requests)
            .field("window_secs", &self.policy.window.num_seconds())
            .field("active_windows", &self.tracked_clients())
            .finish()
    }
}
