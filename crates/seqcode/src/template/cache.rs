use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{Error, Result, Template};

/// Parsed templates keyed by their source expression.
///
/// Each distinct expression is tokenized once per process. Lookups take a
/// read lock only; the write lock is held just long enough to insert a newly
/// parsed template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    parsed: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed template for `source`, parsing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if `source` does not parse. Failed
    /// parses are not cached.
    pub fn get(&self, source: &str) -> Result<Arc<Template>> {
        if let Some(template) = self.parsed.read().get(source) {
            return Ok(Arc::clone(template));
        }

        let template = Template::parse(source).map_err(|reason| Error::InvalidTemplate {
            template: source.to_string(),
            reason,
        })?;
        let mut parsed = self.parsed.write();
        let entry = parsed
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(template));
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.parsed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.read().is_empty()
    }
}
