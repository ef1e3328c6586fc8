use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ConfigType, Result, SerialConfig, SerialStore, SharedCache, config_key, config_pattern,
    counter_pattern,
};

/// Cache-aside lookup of [`SerialConfig`]s.
///
/// Configurations are cached as JSON under
/// `seqcode:config:{entity}:{type}:{tenant}` and never expire; writers must
/// call [`invalidate`](Self::invalidate) after changing one.
pub struct ConfigResolver {
    cache: Option<Arc<dyn SharedCache>>,
    store: Arc<dyn SerialStore>,
}

impl ConfigResolver {
    pub fn new(cache: Option<Arc<dyn SharedCache>>, store: Arc<dyn SerialStore>) -> Self {
        Self { cache, store }
    }

    /// Returns the configuration for a coordinate, or `None` if none exists.
    ///
    /// A cache that cannot be read, or holds an entry that no longer decodes,
    /// is bypassed in favor of the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) if
    /// the store lookup fails.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn get_config(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
    ) -> Result<Option<SerialConfig>> {
        let key = config_key(entity, config_type, tenant);

        if let Some(config) = self.cached(&key) {
            return Ok(Some(config));
        }

        let Some(config) = self.store.find_config(entity, config_type, tenant)? else {
            return Ok(None);
        };
        self.fill(&key, &config);
        Ok(Some(config))
    }

    fn cached(&self, key: &str) -> Option<SerialConfig> {
        let cache = self.cache.as_deref()?;
        let json = match cache.get(key) {
            Ok(json) => json?,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "Config cache unavailable, reading store: {_e}");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(config) => Some(config),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%key, "Dropping undecodable cached config: {_e}");
                let _ = cache.delete(&[key.to_string()]);
                None
            }
        }
    }

    fn fill(&self, key: &str, config: &SerialConfig) {
        let Some(cache) = self.cache.as_deref() else {
            return;
        };
        let result = serde_json::to_string(config)
            .map_err(crate::Error::from)
            .and_then(|json| Ok(cache.set(key, &json, None)?));
        if let Err(_e) = result {
            #[cfg(feature = "tracing")]
            tracing::warn!(%key, "Failed to cache config: {_e}");
        }
    }

    /// Clears a configuration's cache entry and every counter issued under it.
    ///
    /// Returns the number of cache entries removed. Without a cache there is
    /// nothing to clear.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheUnavailable`](crate::Error::CacheUnavailable) if
    /// the cache cannot be swept, since stale counters under a changed
    /// template must not survive.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(config = %config.id)))]
    pub fn invalidate(&self, config: &SerialConfig) -> Result<usize> {
        let Some(cache) = self.cache.as_deref() else {
            return Ok(0);
        };
        let mut keys = cache.keys_matching(&counter_pattern(
            &config.entity_class_name,
            config.config_type,
            &config.tenant_code,
        ))?;
        keys.push(config_key(
            &config.entity_class_name,
            config.config_type,
            &config.tenant_code,
        ));
        Ok(cache.delete(&keys)?)
    }

    /// Drops every cached configuration. Counters are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheUnavailable`](crate::Error::CacheUnavailable) if
    /// the cache cannot be swept.
    pub fn invalidate_all(&self) -> Result<usize> {
        let Some(cache) = self.cache.as_deref() else {
            return Ok(0);
        };
        let keys = cache.keys_matching(&config_pattern())?;
        Ok(cache.delete(&keys)?)
    }
}
