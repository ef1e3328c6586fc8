//! The tenant- and isolation-aware issuance service.
//!
//! [`SerialService`] resolves a configuration for the caller's tenant,
//! advances the partition's counter, renders the code and publishes an
//! [`IsolationRecord`] snapshot. It also carries the management operations
//! that keep the configuration cache and counters consistent with the store.

mod request;

use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

pub use request::*;

use crate::{
    BarcodePolicy, Clock, ConfigResolver, ConfigType, CycleStrategy, Error, IsolationRecord,
    IssuePath, Issued, LocalClock, Partition, RecordPublisher, Result, SequenceIssuer,
    SerialConfig, SerialStore, SharedCache, StorePublisher, TemplateCache, calibrate,
    issuer::{advance, wrap},
};

/// Issues codes for multi-tenant callers.
///
/// Construct with [`new`](Self::new) and adjust with the `with_*` methods.
/// By default snapshots are written synchronously to the same store through a
/// [`StorePublisher`] and dates are taken from the host's local clock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use seqcode::{
///     ConfigType, IssueRequest, MemoryCache, MemoryStore, SerialConfig, SerialService,
/// };
///
/// let store = Arc::new(MemoryStore::with_configs([SerialConfig::new(
///     "cfg-1",
///     "com.acme.Order",
///     ConfigType::Number,
///     "SO-#{0000}",
///     "acme",
/// )]));
/// let service = SerialService::new(store, Some(Arc::new(MemoryCache::new())));
///
/// let request = IssueRequest::new("com.acme.Order").tenant("acme");
/// assert_eq!(service.issue_number(&request).unwrap(), "SO-0001");
/// assert_eq!(service.issue_number(&request).unwrap(), "SO-0002");
/// ```
pub struct SerialService {
    cache: Option<Arc<dyn SharedCache>>,
    store: Arc<dyn SerialStore>,
    resolver: ConfigResolver,
    barcodes: BarcodePolicy,
    publisher: Arc<dyn RecordPublisher>,
    clock: Arc<dyn Clock>,
    templates: TemplateCache,
    options: ServiceOptions,
}

impl SerialService {
    /// Creates a service over `store`. Without a cache, issuance runs on the
    /// uncoordinated path.
    pub fn new(store: Arc<dyn SerialStore>, cache: Option<Arc<dyn SharedCache>>) -> Self {
        Self {
            resolver: ConfigResolver::new(cache.clone(), store.clone()),
            barcodes: BarcodePolicy::new(store.clone()),
            publisher: Arc::new(StorePublisher::new(store.clone())),
            clock: Arc::new(LocalClock),
            templates: TemplateCache::new(),
            options: ServiceOptions::default(),
            cache,
            store,
        }
    }

    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn RecordPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub const fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Issues a number-type code.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    pub fn issue_number(&self, request: &IssueRequest) -> Result<String> {
        self.issue(ConfigType::Number, request)
    }

    /// Issues a barcode, reusing the reference's earlier code when the
    /// configuration says so.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    pub fn issue_barcode(&self, request: &IssueRequest) -> Result<String> {
        self.issue(ConfigType::Barcode, request)
    }

    /// Issues and renders the next code for the request's coordinate.
    ///
    /// # Errors
    ///
    /// - [`Error::TenantNotResolved`] if the request has no tenant.
    /// - [`Error::ConfigNotFound`] or [`Error::ConfigDisabled`] if there is no
    ///   active configuration for the coordinate.
    /// - [`Error::StoreUnavailable`] if the configuration cannot be read.
    /// - [`Error::InvalidTemplate`] or [`Error::MissingParameter`] if the code
    ///   cannot be rendered. Both are detected before a counter advances.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(entity = %request.entity, %config_type))
    )]
    pub fn issue(&self, config_type: ConfigType, request: &IssueRequest) -> Result<String> {
        let tenant = resolve_tenant(request.tenant.as_deref())?;
        let config = self.active_config(&request.entity, config_type, tenant)?;
        let isolation = self.isolation_or_default(request.isolation.as_deref());
        let template = self.templates.get(&config.expression_config)?;
        let policy = self.options.param_policy;
        let now = self.clock.now();

        let fresh = || {
            if config.gen_flag {
                return template.render(config.current_serial, now, &request.params, policy);
            }
            template.check_params(&request.params, policy)?;
            let partition = Partition::new(tenant, isolation, config.cycle_strategy, now);
            let number = self.next_number(&config, &partition)?;
            template.render(number, now, &request.params, policy)
        };

        let reference = request.reference_id.as_deref().and_then(non_blank);
        match (config_type, reference) {
            (ConfigType::Barcode, Some(reference)) => {
                self.barcodes.resolve(&config, reference, isolation, fresh)
            }
            _ => fresh(),
        }
    }

    fn active_config(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
    ) -> Result<SerialConfig> {
        let config = self
            .resolver
            .get_config(entity, config_type, tenant)?
            .ok_or_else(|| Error::ConfigNotFound {
                entity: entity.to_string(),
                config_type,
                tenant: tenant.to_string(),
            })?;
        if !config.activated {
            return Err(Error::ConfigDisabled { id: config.id });
        }
        Ok(config)
    }

    fn isolation_or_default<'a>(&'a self, isolation: Option<&'a str>) -> &'a str {
        isolation
            .and_then(non_blank)
            .unwrap_or(&self.options.default_isolation)
    }

    /// Persists a configuration and clears everything cached for it.
    ///
    /// If the configuration replaces one with different coordinates, the old
    /// coordinates are cleared too.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTemplate`] if the expression does not parse.
    /// - [`Error::StoreUnavailable`] or [`Error::CacheUnavailable`] if the
    ///   write or the invalidation fails.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(config = %config.id)))]
    pub fn save_config(&self, config: SerialConfig) -> Result<SerialConfig> {
        self.templates.get(&config.expression_config)?;

        let previous = self.store.find_config_by_id(&config.id)?;
        let saved = self.store.save_config(config)?;
        if let Some(previous) = previous {
            self.resolver.invalidate(&previous)?;
        }
        self.resolver.invalidate(&saved)?;
        Ok(saved)
    }

    /// Deletes a configuration along with its isolation records and cached
    /// state. Returns the deleted configuration, or `None` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] or [`Error::CacheUnavailable`] if
    /// any step fails.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn delete_config(&self, id: &str) -> Result<Option<SerialConfig>> {
        let Some(config) = self.store.find_config_by_id(id)? else {
            return Ok(None);
        };
        self.resolver.invalidate(&config)?;
        let _removed = self.store.delete_isolation_records(id)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(records = _removed, "Deleted isolation records");

        Ok(self.store.delete_config(id)?)
    }

    /// Flips a configuration's `activated` flag. Returns the updated
    /// configuration, or `None` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] or [`Error::CacheUnavailable`] if
    /// any step fails.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn toggle_activation(&self, id: &str) -> Result<Option<SerialConfig>> {
        let Some(mut config) = self.store.find_config_by_id(id)? else {
            return Ok(None);
        };
        config.activated = !config.activated;
        let saved = self.store.save_config(config)?;
        self.resolver.invalidate(&saved)?;
        Ok(Some(saved))
    }

    /// Overwrites the last issued number of a partition's current bucket.
    ///
    /// The partition's cached counter is dropped, so the next issuance there
    /// continues from `current + 1`.
    ///
    /// # Errors
    ///
    /// - [`Error::TenantNotResolved`] or [`Error::ConfigNotFound`] as for
    ///   [`issue`](Self::issue).
    /// - [`Error::RecordNotFound`] if the partition has not issued in the
    ///   current bucket.
    /// - [`Error::StoreUnavailable`] or [`Error::CacheUnavailable`] if the
    ///   write or the invalidation fails.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn refresh_current_number(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
        isolation: Option<&str>,
        current: u64,
    ) -> Result<IsolationRecord> {
        let (config, partition) = self.partition_of(entity, config_type, tenant, isolation)?;
        let mut record = self.find_record(&config, &partition)?;
        record.current_number = current;
        self.store.replace_isolation_record(record.clone())?;

        if let Some(cache) = self.cache.as_deref() {
            cache.delete(&[partition.counter_key(&config)])?;
        }
        Ok(record)
    }

    /// Returns the isolation record of a partition's current bucket.
    ///
    /// The record may lag the cached counter by numbers whose snapshots are
    /// still in flight.
    ///
    /// # Errors
    ///
    /// As for [`refresh_current_number`](Self::refresh_current_number), minus
    /// the write failures.
    pub fn current_number(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
        isolation: Option<&str>,
    ) -> Result<IsolationRecord> {
        let (config, partition) = self.partition_of(entity, config_type, tenant, isolation)?;
        self.find_record(&config, &partition)
    }

    /// Drops every cached configuration. Returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheUnavailable`] if the cache cannot be swept.
    pub fn clear_config_cache(&self) -> Result<usize> {
        self.resolver.invalidate_all()
    }

    fn partition_of(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
        isolation: Option<&str>,
    ) -> Result<(SerialConfig, Partition)> {
        let tenant = resolve_tenant(Some(tenant))?;
        let config = self
            .resolver
            .get_config(entity, config_type, tenant)?
            .ok_or_else(|| Error::ConfigNotFound {
                entity: entity.to_string(),
                config_type,
                tenant: tenant.to_string(),
            })?;
        let partition = Partition::new(
            tenant,
            self.isolation_or_default(isolation),
            config.cycle_strategy,
            self.clock.now(),
        );
        Ok((config, partition))
    }

    fn find_record(&self, config: &SerialConfig, partition: &Partition) -> Result<IsolationRecord> {
        self.store
            .find_isolation_record(&config.id, &partition.isolation, &partition.bucket)?
            .ok_or_else(|| Error::RecordNotFound {
                config_id: config.id.clone(),
                isolation: partition.isolation.clone(),
                bucket: partition.bucket.clone(),
            })
    }
}

impl SequenceIssuer for SerialService {
    /// Advances the counter, calibrating a cold one from the partition's
    /// isolation record first, and publishes the resulting snapshot.
    fn next_issued(&self, config: &SerialConfig, partition: &Partition) -> Result<Issued> {
        let template = self.templates.get(&config.expression_config)?;
        let key = partition.counter_key(config);
        let cache = self.cache.as_deref();

        let mut issued = advance(cache, &key, partition.ttl, || {
            calibrate(self.store.as_ref(), config, &template, partition)
        });
        if config.cycle_strategy == CycleStrategy::Unbounded {
            issued = wrap(issued, template.serial_width());
        }

        let record = IsolationRecord::new(
            config.id.as_str(),
            partition.isolation.as_str(),
            partition.bucket.as_str(),
            issued.number,
        );
        if issued.path == IssuePath::RolledOver {
            self.publisher.publish_rollover(record);
        } else {
            self.publisher.publish(record);
        }
        Ok(issued)
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

fn resolve_tenant(tenant: Option<&str>) -> Result<&str> {
    tenant.and_then(non_blank).ok_or(Error::TenantNotResolved)
}
