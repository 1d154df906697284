//! Time provider abstraction
//!
//! Registration timestamps and the daily digest window both read the current
//! time through a [`Clock`], so tests can pin "now" to a known instant.
//!
//! # Example
//!
//! ```
//! use startpage::{Clock, FixedClock};
//!
//! let clock = FixedClock::from_rfc3339("2024-03-05T08:30:00Z").unwrap();
//! assert_eq!(clock.now().to_rfc3339(), "2024-03-05T08:30:00+00:00");
//! clock.advance_secs(60);
//! assert_eq!(clock.now().to_rfc3339(), "2024-03-05T08:31:00+00:00");
//! ```

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeZone, Utc};

/// A time provider for getting current timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> i64;

    /// Returns the current time as a UTC timestamp.
    fn now(&self) -> DateTime<Utc> {
        millis_to_datetime(self.now_millis())
    }
}

/// Convert milliseconds since the Unix epoch to a UTC timestamp.
///
/// Out-of-range values clamp to the epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock.
///
/// Unlike [`SystemClock`] it never moves on its own; call [`FixedClock::set`] or
/// one of the `advance_*` methods.
pub struct FixedClock {
    millis: Mutex<i64>,
}

impl FixedClock {
    /// Create a new fixed clock at the given time in milliseconds.
    pub fn new(millis: i64) -> Self {
        Self {
            millis: Mutex::new(millis),
        }
    }

    /// Create a clock from an RFC3339 timestamp.
    pub fn from_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self::new(dt.timestamp_millis()))
    }

    /// Move the clock forward.
    pub fn advance_secs(&self, secs: i64) {
        *self.lock() += secs * 1000;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance_secs(days * 86_400);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, millis: i64) {
        *self.lock() = millis;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, i64> {
        self.millis.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        *self.lock()
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedClock")
            .field("millis", &*self.lock())
            .finish()
    }
}
