//! Clock abstraction so signing times can be pinned in tests.

use chrono::{DateTime, Utc};

/// Source of the current time for `Date` headers and query expiry.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current time as whole unix seconds.
    fn unix_seconds(&self) -> i64 {
        self.now_utc().timestamp()
    }
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    now: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Create a mock clock at the given unix second.
    pub fn at_unix(seconds: i64) -> Self {
        Self {
            now: DateTime::from_timestamp(seconds, 0).expect("unix seconds in range"),
        }
    }

    /// Create a mock clock from an HTTP date such as `Wed, 09 Jun 2021 16:08:15 GMT`.
    pub fn from_http_date(s: &str) -> Self {
        Self {
            now: DateTime::parse_from_rfc2822(s)
                .expect("valid RFC 2822 date")
                .with_timezone(&Utc),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}
