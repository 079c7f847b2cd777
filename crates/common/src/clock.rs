//! Clock abstraction and date formatting helpers.
//!
//! Time-dependent checks (token expiry) read the current time through the
//! [`Clock`] trait so tests can pin or advance time deterministically.

use chrono::{DateTime, NaiveDateTime};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Display format for timestamps shown to users (`yyyy-MM-dd HH:mm:ss`).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current time in Unix epoch seconds.
pub trait Clock: Send + Sync {
    /// Returns the current Unix timestamp in seconds.
    fn now_secs(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc::now()`.
///
/// This is the clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for tests.
///
/// Starts at a fixed timestamp and only moves when told to. Safe to share
/// across threads; all reads see the latest `set`/`advance`.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Creates a clock pinned at `timestamp` (Unix epoch seconds).
    #[must_use]
    pub const fn new(timestamp: i64) -> Self {
        Self {
            now: AtomicI64::new(timestamp),
        }
    }

    /// Pins the clock at `timestamp`.
    pub fn set(&self, timestamp: i64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    /// Moves the clock forward by `by`, saturating at `i64::MAX`.
    pub fn advance(&self, by: Duration) {
        let secs = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        // fetch_update only fails if the closure returns None, which it never does
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Format a date-time as `yyyy-MM-dd HH:mm:ss`.
#[must_use]
pub fn format_datetime(date_time: &NaiveDateTime) -> String {
    date_time.format(DATETIME_FORMAT).to_string()
}

/// Format a Unix timestamp (UTC) as `yyyy-MM-dd HH:mm:ss`.
///
/// Returns `None` when the timestamp is outside the range chrono can
/// represent.
#[must_use]
pub fn format_unix_timestamp(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| format_datetime(&dt.naive_utc()))
}
