//! Clock abstraction and queue timestamp helpers

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Days between task creation and deadline
pub const DEADLINE_DAYS: i64 = 1;

/// Days between task creation and expiry, also the artifact retention
pub const EXPIRY_DAYS: i64 = 365;

/// Task deadline relative to creation
pub fn default_deadline() -> Duration {
    Duration::days(DEADLINE_DAYS)
}

/// Task and artifact expiry relative to creation
pub fn default_expiry() -> Duration {
    Duration::days(EXPIRY_DAYS)
}

/// Source of the current time.
///
/// Task definitions compute all of their timestamps at construction time;
/// tests substitute [`FixedClock`] to make them deterministic.
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Time `offset` from now
    fn from_now(&self, offset: Duration) -> DateTime<Utc> {
        self.now() + offset
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Format a timestamp the way the queue expects (`2019-03-07T10:00:00.000Z`)
pub fn queue_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
