use core::time::Duration;
use std::{collections::HashMap, time::Instant};

use parking_lot::Mutex;

use crate::{CacheError, SharedCache, glob_match};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// An in-process [`SharedCache`].
///
/// Every operation runs under one mutex, which makes `increment` and
/// `set_if_absent` atomic across threads of the same process. Expired entries
/// are dropped lazily when touched.
///
/// Suitable for tests and single-process deployments; processes that share
/// counters need a networked backend.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time left before `key` expires. `None` for missing or persistent keys.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut entries = self.entries.lock();
        let expires_at = live(&mut entries, key)?.expires_at?;
        Some(expires_at.saturating_duration_since(Instant::now()))
    }

    /// Reads a counter entry as an integer.
    pub fn counter(&self, key: &str) -> Option<u64> {
        self.get(key).ok().flatten()?.parse().ok()
    }
}

fn live<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn bump(entry: &mut Entry, key: &str) -> Result<u64, CacheError> {
    let current: u64 = entry
        .value
        .parse()
        .map_err(|_| CacheError::new(format!("value at `{key}` is not an integer")))?;
    let next = current
        .checked_add(1)
        .ok_or_else(|| CacheError::new(format!("increment would overflow at `{key}`")))?;
    entry.value = next.to_string();
    Ok(next)
}

impl SharedCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock();
        Ok(live(&mut entries, key).map(|e| e.value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.entries
            .lock()
            .insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(())
    }

    fn delete(&self, keys: &[String]) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|e| e.is_live(now))
            .count())
    }

    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock();
        Ok(live(&mut entries, key).is_some())
    }

    fn increment(&self, key: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock();
        match live(&mut entries, key) {
            Some(entry) => bump(entry, key),
            None => {
                entries.insert(key.to_string(), Entry::new("1".to_string(), None));
                Ok(1)
            }
        }
    }

    fn increment_if_exists(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let mut entries = self.entries.lock();
        live(&mut entries, key).map(|entry| bump(entry, key)).transpose()
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: u64,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock();
        if live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value.to_string(), ttl));
        Ok(true)
    }

    fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(entries
            .iter()
            .filter(|(key, e)| e.is_live(now) && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
