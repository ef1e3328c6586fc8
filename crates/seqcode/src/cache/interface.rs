use core::time::Duration;

use crate::CacheError;

/// The shared fast key-value store that coordinates counters across requests
/// and processes.
///
/// This is the only synchronization point of the issuance engine, so
/// [`increment`], [`increment_if_exists`] and [`set_if_absent`] must be atomic
/// with respect to every other caller of the same backend. A Redis
/// implementation maps these onto `INCR`, a script running `EXISTS` then
/// `INCR`, and `SET NX PX`.
///
/// Values are strings. Counters are stored as base-10 integers so that
/// [`increment`] and [`get`] agree on one representation.
///
/// [`increment`]: SharedCache::increment
/// [`increment_if_exists`]: SharedCache::increment_if_exists
/// [`set_if_absent`]: SharedCache::set_if_absent
/// [`get`]: SharedCache::get
pub trait SharedCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value`, replacing any existing entry. `None` never expires.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Removes `keys`, returning how many existed.
    fn delete(&self, keys: &[String]) -> Result<usize, CacheError>;

    fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Atomically adds one to the counter at `key` and returns the new value.
    ///
    /// A missing key counts from zero. Any existing expiry is kept.
    fn increment(&self, key: &str) -> Result<u64, CacheError>;

    /// Atomically adds one to the counter at `key` if it is live.
    ///
    /// Returns `None` without creating the key when it is missing or expired,
    /// so a counter that vanished is never restarted from zero.
    fn increment_if_exists(&self, key: &str) -> Result<Option<u64>, CacheError>;

    /// Atomically stores `value` only if `key` is absent.
    ///
    /// Returns `true` if this call created the entry.
    fn set_if_absent(&self, key: &str, value: u64, ttl: Option<Duration>)
    -> Result<bool, CacheError>;

    /// Lists keys matching a glob `pattern` where `*` matches any run of
    /// characters.
    fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}
