use std::{collections::HashMap, sync::Arc};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    BasicIssuer, Clock, ConfigType, DEFAULT_ISOLATION, Error, LocalClock, ParamPolicy, Params,
    Partition, Result, SequenceIssuer, SerialConfig, SerialStore, SharedCache,
};

/// Where a [`NumberGenerator`] looks up the configuration for an entity.
///
/// Typically a client of a remote configuration service. Closures and maps
/// keyed by entity name implement it directly.
pub trait ConfigSource: Send + Sync {
    /// Returns the number configuration for `entity`, if one exists.
    ///
    /// # Errors
    ///
    /// Implementations report transport failures as
    /// [`Error::StoreUnavailable`].
    fn fetch(&self, entity: &str) -> Result<Option<SerialConfig>>;
}

impl<F> ConfigSource for F
where
    F: Fn(&str) -> Result<Option<SerialConfig>> + Send + Sync,
{
    fn fetch(&self, entity: &str) -> Result<Option<SerialConfig>> {
        self(entity)
    }
}

impl ConfigSource for HashMap<String, SerialConfig> {
    fn fetch(&self, entity: &str) -> Result<Option<SerialConfig>> {
        Ok(self.get(entity).cloned())
    }
}

/// Renders numbers for an application that has no tenant context.
///
/// Each call fetches the entity's configuration from a [`ConfigSource`] and
/// issues through a [`BasicIssuer`], so cold counters calibrate from the
/// application's own persisted codes. Counters are keyed by the
/// configuration's tenant and the default isolation.
///
/// # Example
///
/// ```
/// use std::{collections::HashMap, sync::Arc};
///
/// use seqcode::{ConfigType, MemoryCache, MemoryStore, NumberGenerator, Params, SerialConfig};
///
/// let config = SerialConfig::new("cfg", "Order", ConfigType::Number, "SO#{0000}", "acme");
/// let configs = HashMap::from([("Order".to_string(), config)]);
///
/// let generator = NumberGenerator::new(
///     Arc::new(configs),
///     Some(Arc::new(MemoryCache::new())),
///     Arc::new(MemoryStore::new()),
/// );
///
/// assert_eq!(generator.get_number("Order", &Params::new()).unwrap(), "SO0001");
/// assert_eq!(generator.get_number("Order", &Params::new()).unwrap(), "SO0002");
/// ```
pub struct NumberGenerator {
    source: Arc<dyn ConfigSource>,
    issuer: BasicIssuer,
    clock: Arc<dyn Clock>,
    param_policy: ParamPolicy,
}

impl NumberGenerator {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        cache: Option<Arc<dyn SharedCache>>,
        store: Arc<dyn SerialStore>,
    ) -> Self {
        Self {
            source,
            issuer: BasicIssuer::new(cache, store),
            clock: Arc::new(LocalClock),
            param_policy: ParamPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_param_policy(mut self, param_policy: ParamPolicy) -> Self {
        self.param_policy = param_policy;
        self
    }

    /// Issues and renders the next number for `entity`.
    ///
    /// A configuration with `gen_flag` set renders its `current_serial`
    /// without touching any counter.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`] if the source has no configuration.
    /// - [`Error::ConfigDisabled`] if it is deactivated.
    /// - [`Error::InvalidTemplate`] or [`Error::MissingParameter`] if it
    ///   cannot be rendered.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, params)))]
    pub fn get_number(&self, entity: &str, params: &Params) -> Result<String> {
        let config = self
            .source
            .fetch(entity)?
            .ok_or_else(|| Error::ConfigNotFound {
                entity: entity.to_string(),
                config_type: ConfigType::Number,
                tenant: String::new(),
            })?;
        if !config.activated {
            return Err(Error::ConfigDisabled { id: config.id });
        }

        let template = self.issuer.templates().get(&config.expression_config)?;
        let now = self.clock.now();

        if config.gen_flag {
            return template.render(config.current_serial, now, params, self.param_policy);
        }

        template.check_params(params, self.param_policy)?;
        let partition = Partition::new(
            config.tenant_code.as_str(),
            DEFAULT_ISOLATION,
            config.cycle_strategy,
            now,
        );
        let number = self.issuer.next_number(&config, &partition)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%entity, number, "Issued number");

        template.render(number, now, params, self.param_policy)
    }
}
