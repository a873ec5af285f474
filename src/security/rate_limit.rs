//! Sliding-window request rate limiting.
//!
//! Counts events in the trailing interval ending at "now" rather than in
//! fixed buckets, so a burst straddling a bucket boundary cannot double the
//! effective allowance. One limiter instance per policy: general API traffic
//! and refresh-endpoint attempts are tracked in separate maps with separate
//! thresholds, because refresh abuse warrants much tighter bounds.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs as i64),
        }
    }
}

pub struct SlidingWindowLimiter {
    policy: RateLimitPolicy,
    /// identifier -> request timestamps (millis), pruned lazily on access
    windows: DashMap<String, Vec<i64>>,
}

impl SlidingWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: DashMap::new(),
        }
    }

    /// Admission check for one request.
    ///
    /// Prunes timestamps that fell out of the window, then either records
    /// `now` and admits, or rejects without recording — a rejected attempt
    /// does not count against future windows. The DashMap entry guard
    /// serializes the prune/compare/append sequence per identifier.
    pub fn admit(&self, identifier: &str, now: DateTime<Utc>) -> bool {
        let now_ms = now.timestamp_millis();
        let cutoff = now_ms - self.policy.window.num_milliseconds();

        let mut window = self.windows.entry(identifier.to_string()).or_default();
        window.retain(|ts| *ts > cutoff);

        if window.len() >= self.policy.max_requests as usize {
            return false;
        }

        window.push(now_ms);
        true
    }
}

/// Derive the identifier a request is rate-limited under.
///
/// Prefers the bearer credential so one client cannot exhaust the budget of
/// header-less traffic from the same origin; falls back to the network
/// origin when no credential is presented.
pub fn request_identifier(authorization: Option<&str>, remote_addr: &str) -> String {
    if let Some(header) = authorization {
        if let Some(token) = header.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return token.to_string();
            }
        }
    }
    remote_addr.to_string()
}
