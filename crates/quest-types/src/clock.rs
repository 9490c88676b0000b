//! Time source abstraction.
//!
//! Tree mutations take an explicit `now` so the filesystem itself never reads
//! the wall clock. The shell asks its [`Clock`] once per submitted line.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Timestamp stored on every node.
pub type Timestamp = DateTime<Utc>;

/// A source of the current time.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A deterministic clock for tests and reproducible lessons.
///
/// Clones share the same instant, so a test can keep a handle after moving
/// the clock into a shell and still move time forward.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Rc<Cell<Timestamp>>,
}

impl FixedClock {
    /// Create a clock frozen at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            instant: Rc::new(Cell::new(at)),
        }
    }

    /// Create a clock frozen at a calendar date (UTC). Falls back to the Unix
    /// epoch when the date is invalid.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> Self {
        let at = Utc
            .with_ymd_and_hms(year, month, day, hour, min, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        Self::new(at)
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        self.instant.set(at);
    }

    /// Move the clock forward by `secs` seconds.
    pub fn advance(&self, secs: i64) {
        self.instant.set(self.instant.get() + Duration::seconds(secs));
    }
}

impl Default for FixedClock {
    /// July 28, 12:00 UTC: the date the lesson listings show.
    fn default() -> Self {
        Self::at(2025, 7, 28, 12, 0)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.instant.get()
    }
}
