// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window submission limiter.
//!
//! Every check prunes the persisted log to the trailing window, admits the
//! attempt if fewer than `max_submissions` remain, and writes the log back.
//! Rejected attempts are not recorded, so they never extend the lockout.

use crate::config::RateLimitConfig;
use crate::store::{StoreError, TimestampStore};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission is admitted
    Allowed {
        /// Submissions still available in the current window
        remaining: usize,
        /// Time until the oldest counted submission leaves the window
        reset_in: Duration,
    },
    /// Submission is rejected
    Limited {
        /// Time until a slot frees up
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Outcome of [`admit`]: the decision plus the log to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub admitted: bool,
    pub log: Vec<i64>,
}

/// Decide whether a submission at `now` may proceed.
///
/// Entries with `timestamp <= now - window_ms` are dropped. If the remaining
/// count is at least `max_count` the pruned log is returned unchanged,
/// otherwise `now` is appended.
pub fn admit(log: &[i64], now: i64, window_ms: i64, max_count: usize) -> Admission {
    let cutoff = now.saturating_sub(window_ms);
    let mut pruned: Vec<i64> = log.iter().copied().filter(|&t| t > cutoff).collect();

    if pruned.len() >= max_count {
        return Admission {
            admitted: false,
            log: pruned,
        };
    }

    pruned.push(now);
    Admission {
        admitted: true,
        log: pruned,
    }
}

/// Time until the oldest entry of `log` falls out of the window.
fn time_until_expiry(log: &[i64], now: i64, window_ms: i64) -> Duration {
    log.iter()
        .min()
        .map(|&oldest| {
            let expires_at = oldest.saturating_add(window_ms);
            Duration::from_millis(expires_at.saturating_sub(now).max(0) as u64)
        })
        .unwrap_or(Duration::ZERO)
}

/// Rate limiter over an injected timestamp store.
pub struct RateLimiter<S> {
    config: RateLimitConfig,
    store: S,
}

impl<S: TimestampStore> RateLimiter<S> {
    /// Create a new rate limiter with the given configuration and store.
    pub fn new(config: RateLimitConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check and record a submission attempt made at `now` (Unix millis).
    ///
    /// The pruned log is persisted on both paths.
    pub fn check(&self, now: i64) -> Result<RateLimitResult, StoreError> {
        let log = match self.store.read() {
            Ok(log) => log,
            Err(StoreError::Corrupt { key, reason }) => {
                warn!(%key, %reason, "Discarding unreadable timestamp log");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let window_ms = self.config.window_ms;
        let max = self.config.max_submissions;
        let admission = admit(&log, now, window_ms, max);
        self.store.write(&admission.log)?;

        if admission.admitted {
            let remaining = max.saturating_sub(admission.log.len());
            debug!(remaining, "Submission admitted");
            Ok(RateLimitResult::Allowed {
                remaining,
                reset_in: time_until_expiry(&admission.log, now, window_ms),
            })
        } else {
            let retry_after = time_until_expiry(&admission.log, now, window_ms);
            debug!(
                recent = admission.log.len(),
                retry_after_ms = retry_after.as_millis() as u64,
                "Submission rate limited"
            );
            Ok(RateLimitResult::Limited { retry_after })
        }
    }
}
