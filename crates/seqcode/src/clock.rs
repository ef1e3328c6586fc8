use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// A source of local wall-clock time.
///
/// Date placeholders and cycle buckets are both derived from this clock, so a
/// single request renders and partitions against the same instant. Swap in a
/// [`FixedClock`] for deterministic tests.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use seqcode::{Clock, FixedClock};
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let clock = FixedClock::new(at);
/// assert_eq!(clock.now(), at);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub const fn new(at: NaiveDateTime) -> Self {
        Self { at: Mutex::new(at) }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.at.lock() = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.at.lock()
    }
}
