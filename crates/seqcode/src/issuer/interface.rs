use core::time::Duration;

use chrono::NaiveDateTime;

use crate::{CycleStrategy, Result, SerialConfig, bucket_key, counter_key, ttl_until_boundary};

/// The coordinate a counter is scoped to, below its configuration.
///
/// The bucket and its cache lifetime are derived from one instant, so a
/// request never seeds a counter for one bucket with the lifetime of another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub tenant: String,
    pub isolation: String,
    /// Cycle bucket key, empty for unbounded counters.
    pub bucket: String,
    /// Lifetime of a counter seeded now. `None` never expires.
    pub ttl: Option<Duration>,
}

impl Partition {
    pub fn new(
        tenant: impl Into<String>,
        isolation: impl Into<String>,
        strategy: CycleStrategy,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            isolation: isolation.into(),
            bucket: bucket_key(strategy, now),
            ttl: ttl_until_boundary(strategy, now),
        }
    }

    /// Cache key of this partition's counter under `config`.
    pub fn counter_key(&self, config: &SerialConfig) -> String {
        counter_key(
            &config.entity_class_name,
            config.config_type,
            &self.tenant,
            &self.isolation,
            &self.bucket,
        )
    }
}

/// How an issued number was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuePath {
    /// The cached counter existed and was incremented.
    Incremented,
    /// This caller seeded a cold counter and consumed the seed.
    Seeded,
    /// Another caller seeded first; the counter was incremented instead.
    LostSeedRace,
    /// No cache was reachable. The number was calibrated without any
    /// cross-request coordination.
    Degraded,
    /// An unbounded counter outgrew its field; this is the 1 that starts the
    /// next lap.
    RolledOver,
}

/// A counter value together with the path that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Issued {
    pub number: u64,
    pub path: IssuePath,
}

impl Issued {
    pub const fn new(number: u64, path: IssuePath) -> Self {
        Self { number, path }
    }

    /// Returns `true` unless the number was handed out without the shared
    /// cache's atomic primitives.
    pub const fn is_coordinated(&self) -> bool {
        !matches!(self.path, IssuePath::Degraded)
    }
}

/// A minimal interface for advancing a configuration's counter.
///
/// Implementations differ in where they calibrate a cold counter from and in
/// what they do after issuing, but share one race-safe advance over the
/// [`SharedCache`](crate::SharedCache).
pub trait SequenceIssuer {
    /// Returns the next counter value for `partition` under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`](crate::Error::InvalidTemplate) if the
    /// configuration's expression does not parse. Backend failures do not
    /// surface here; they degrade the issuance path instead.
    fn next_number(&self, config: &SerialConfig, partition: &Partition) -> Result<u64> {
        self.next_issued(config, partition).map(|issued| issued.number)
    }

    /// Like [`next_number`](Self::next_number), also reporting how the number
    /// was obtained.
    ///
    /// # Errors
    ///
    /// See [`next_number`](Self::next_number).
    fn next_issued(&self, config: &SerialConfig, partition: &Partition) -> Result<Issued>;
}
