//! Rolling message quota types for Relaychat.
//!
//! Each identity owns one [`UsageRecord`]. The record resets lazily: on any
//! read after `reset_at` has passed, the count drops to zero and a fresh
//! window starts from the time of that read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Quota parameters shared by every identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsagePolicy {
    pub limit: u32,
    pub window: Duration,
}

impl UsagePolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

impl Default for UsagePolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::hours(3),
        }
    }
}

/// Message counter for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl UsageRecord {
    /// A fresh record with an empty count and a full window ahead.
    pub fn fresh(now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window,
        }
    }

    /// Apply the lazy window reset. Returns `true` if the record changed.
    ///
    /// Expiry is strict: at `now == reset_at` the window is still open.
    pub fn refresh(&mut self, now: DateTime<Utc>, window: Duration) -> bool {
        if now > self.reset_at {
            *self = Self::fresh(now, window);
            true
        } else {
            false
        }
    }

    pub fn is_limited(&self, limit: u32) -> bool {
        self.count >= limit
    }

    pub fn remaining(&self, limit: u32) -> u32 {
        limit.saturating_sub(self.count)
    }

    pub fn limit_info(&self, now: DateTime<Utc>, limit: u32) -> LimitInfo {
        LimitInfo {
            remaining_time: (self.reset_at - now).num_seconds().max(0),
            reset_time: self.reset_at.format("%H:%M:%S").to_string(),
            limit,
        }
    }

    /// Status as seen by a caller, after the lazy reset has been applied.
    pub fn status(&self, now: DateTime<Utc>, limit: u32) -> UsageStatus {
        let is_limited = self.is_limited(limit);
        UsageStatus {
            is_limited,
            remaining_messages: self.remaining(limit),
            limit_info: is_limited.then(|| self.limit_info(now, limit)),
        }
    }
}

/// Details about an exhausted quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitInfo {
    /// Seconds until the window resets, never negative.
    pub remaining_time: i64,
    /// Wall-clock reset time, `HH:MM:SS` (UTC).
    pub reset_time: String,
    pub limit: u32,
}

/// Quota status for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub is_limited: bool,
    pub remaining_messages: u32,
    pub limit_info: Option<LimitInfo>,
}

/// Outcome of an atomic check-and-increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire {
    /// A slot was taken; `remaining` counts what is left after it.
    Granted { remaining: u32 },
    /// The quota is exhausted; nothing was changed.
    Limited(LimitInfo),
}

impl Acquire {
    pub fn is_granted(&self) -> bool {
        matches!(self, Acquire::Granted { .. })
    }
}
