//! Time buckets for periodically restarting counters.
//!
//! Boundaries are crossed lazily. Nothing sweeps expired counters; the first
//! request in a new bucket simply misses the cache under the new bucket key
//! and calibrates a fresh counter.

use core::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::CycleStrategy;

/// Returns the bucket key for `now` under `strategy`.
///
/// - [`CycleStrategy::Unbounded`]: `""`
/// - [`CycleStrategy::Yearly`]: `"2024"`
/// - [`CycleStrategy::Monthly`]: `"202403"`
pub fn bucket_key(strategy: CycleStrategy, now: NaiveDateTime) -> String {
    match strategy {
        CycleStrategy::Unbounded => String::new(),
        CycleStrategy::Yearly => format!("{:04}", now.year()),
        CycleStrategy::Monthly => format!("{:04}{:02}", now.year(), now.month()),
    }
}

/// Returns the first instant of the bucket after the one containing `now`.
///
/// `None` for [`CycleStrategy::Unbounded`], which has no boundary.
pub fn next_boundary(strategy: CycleStrategy, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = match strategy {
        CycleStrategy::Unbounded => return None,
        CycleStrategy::Yearly => NaiveDate::from_ymd_opt(now.year().checked_add(1)?, 1, 1)?,
        CycleStrategy::Monthly => {
            if now.month() == 12 {
                NaiveDate::from_ymd_opt(now.year().checked_add(1)?, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)?
            }
        }
    };
    start.and_hms_opt(0, 0, 0)
}

/// Returns how long a counter cached at `now` stays valid.
///
/// `None` means the entry never expires. Bounded strategies expire exactly at
/// the next bucket boundary, so the result is always positive.
pub fn ttl_until_boundary(strategy: CycleStrategy, now: NaiveDateTime) -> Option<Duration> {
    let boundary = next_boundary(strategy, now)?;
    (boundary - now).to_std().ok().filter(|ttl| !ttl.is_zero())
}
