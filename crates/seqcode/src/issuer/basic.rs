use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::advance::{advance, wrap};
use crate::{
    CycleStrategy, Issued, Partition, Result, SequenceIssuer, SerialConfig, SerialStore,
    SharedCache, TemplateCache, calibrate_from_codes,
};

/// The minimal issuer: cache coordination plus calibration from persisted
/// codes.
///
/// It knows nothing about isolation records or snapshots, which suits
/// library consumers that persist their own codes. Without a cache every
/// number is calibrated from the store, so concurrent callers may collide.
///
/// ## See Also
/// - [`SerialService`], which layers tenant resolution, isolation records and
///   barcode association on the same advance.
///
/// [`SerialService`]: crate::SerialService
pub struct BasicIssuer {
    cache: Option<Arc<dyn SharedCache>>,
    store: Arc<dyn SerialStore>,
    templates: Arc<TemplateCache>,
}

impl BasicIssuer {
    pub fn new(cache: Option<Arc<dyn SharedCache>>, store: Arc<dyn SerialStore>) -> Self {
        Self::with_templates(cache, store, Arc::new(TemplateCache::new()))
    }

    /// Shares an existing parsed-template cache.
    pub fn with_templates(
        cache: Option<Arc<dyn SharedCache>>,
        store: Arc<dyn SerialStore>,
        templates: Arc<TemplateCache>,
    ) -> Self {
        Self {
            cache,
            store,
            templates,
        }
    }

    pub fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }
}

impl SequenceIssuer for BasicIssuer {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(config = %config.id)))]
    fn next_issued(&self, config: &SerialConfig, partition: &Partition) -> Result<Issued> {
        let template = self.templates.get(&config.expression_config)?;
        let key = partition.counter_key(config);
        let cache = self.cache.as_deref();

        let issued = advance(cache, &key, partition.ttl, || {
            calibrate_from_codes(self.store.as_ref(), config, &template, &partition.bucket)
        });

        if config.cycle_strategy == CycleStrategy::Unbounded {
            return Ok(wrap(issued, template.serial_width()));
        }
        Ok(issued)
    }
}
