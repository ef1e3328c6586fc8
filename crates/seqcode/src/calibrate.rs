//! Starting points for cold counters.
//!
//! When the shared cache holds no counter for a partition, the durable store
//! is consulted for the last number issued there. Each source yields a "last
//! issued" value `L`, and the counter is seeded with `L + 1`.

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CycleStrategy, Partition, SerialConfig, SerialStore, Template};

/// The last number issued for a partition, and where it was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Calibration {
    /// The partition's isolation record for the current bucket.
    Record(u64),
    /// The serial field of the latest persisted code.
    Code(u64),
    /// The configuration's serials, see
    /// [`SerialConfig::configured_last_issued`].
    Configured(u64),
}

impl Calibration {
    pub const fn last_issued(self) -> u64 {
        match self {
            Self::Record(n) | Self::Code(n) | Self::Configured(n) => n,
        }
    }

    /// The value a cold counter is seeded with.
    pub const fn seed(self) -> u64 {
        self.last_issued().saturating_add(1)
    }
}

/// Calibrates from every durable source, most specific first: the partition's
/// isolation record, then the latest persisted code, then the configuration.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(config = %config.id, isolation = %partition.isolation, bucket = %partition.bucket))
)]
pub fn calibrate(
    store: &dyn SerialStore,
    config: &SerialConfig,
    template: &Template,
    partition: &Partition,
) -> Calibration {
    if let Some(n) = recorded_number(store, config, partition) {
        return Calibration::Record(n);
    }
    calibrate_from_codes(store, config, template, &partition.bucket)
}

/// Calibrates from persisted codes only, falling back to the configuration.
pub fn calibrate_from_codes(
    store: &dyn SerialStore,
    config: &SerialConfig,
    template: &Template,
    bucket: &str,
) -> Calibration {
    let calibration = latest_code_number(store, config, template, bucket)
        .map_or_else(
            || Calibration::Configured(config.configured_last_issued()),
            Calibration::Code,
        );

    #[cfg(feature = "tracing")]
    tracing::debug!(?calibration, "Calibrated cold counter");

    calibration
}

/// Reads `current_number` from the partition's isolation record.
///
/// Store failures count as "no record".
pub fn recorded_number(
    store: &dyn SerialStore,
    config: &SerialConfig,
    partition: &Partition,
) -> Option<u64> {
    match store.find_isolation_record(&config.id, &partition.isolation, &partition.bucket) {
        Ok(record) => record.map(|r| r.current_number),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Isolation record lookup failed, calibrating without it: {_e}");
            None
        }
    }
}

/// Extracts the serial field of the highest code in the configuration's
/// [`calibration_source`](SerialConfig::calibration_source).
///
/// Bounded cycles only trust a code that carries the current `bucket`, so a
/// new year or month does not continue last period's numbering. Store
/// failures and unreadable codes count as "no code".
pub fn latest_code_number(
    store: &dyn SerialStore,
    config: &SerialConfig,
    template: &Template,
    bucket: &str,
) -> Option<u64> {
    let code = match store.find_latest_code(config.calibration_source()) {
        Ok(code) => code.filter(|code| !code.trim().is_empty())?,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Latest code lookup failed, calibrating without it: {_e}");
            return None;
        }
    };

    if config.cycle_strategy != CycleStrategy::Unbounded && !code.contains(bucket) {
        #[cfg(feature = "tracing")]
        tracing::debug!(%code, %bucket, "Latest code belongs to an earlier bucket");
        return None;
    }

    match template.extract_serial(&code) {
        Ok(n) => Some(n),
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Ignoring latest code for calibration: {_e}");
            None
        }
    }
}
