use std::sync::Arc;

use crate::{BarCodeAssociate, Result, ReturnStrategy, SerialConfig, SerialStore};

/// Applies a barcode configuration's [`ReturnStrategy`] to a business
/// reference.
///
/// Under [`ReturnStrategy::Repeat`] a reference keeps the first code issued
/// for it. Concurrent first requests for one reference are settled by the
/// store's insert-if-absent, so every caller ends up with the winner's code.
pub struct BarcodePolicy {
    store: Arc<dyn SerialStore>,
}

impl BarcodePolicy {
    pub fn new(store: Arc<dyn SerialStore>) -> Self {
        Self { store }
    }

    /// Returns the code for `reference_id`, calling `issue` only when no
    /// earlier code may be reused.
    ///
    /// A fresh code is associated with the reference afterwards.
    ///
    /// # Errors
    ///
    /// Propagates any error from `issue`. Association reads and writes never
    /// fail the request.
    pub fn resolve(
        &self,
        config: &SerialConfig,
        reference_id: &str,
        isolation: &str,
        issue: impl FnOnce() -> Result<String>,
    ) -> Result<String> {
        if let Some(code) = self.existing(config, reference_id, isolation) {
            #[cfg(feature = "tracing")]
            tracing::debug!(%reference_id, %code, "Returning previously issued barcode");
            return Ok(code);
        }
        let code = issue()?;
        Ok(self.remember(config, reference_id, isolation, code))
    }

    /// The code already associated with `reference_id`, if the configuration
    /// repeats codes and one exists.
    pub fn existing(
        &self,
        config: &SerialConfig,
        reference_id: &str,
        isolation: &str,
    ) -> Option<String> {
        if config.return_strategy != ReturnStrategy::Repeat {
            return None;
        }
        match self
            .store
            .find_association(&config.id, isolation, reference_id)
        {
            Ok(found) => found.filter(BarCodeAssociate::has_code).map(|a| a.bar_code),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%reference_id, "Association lookup failed, issuing fresh: {_e}");
                None
            }
        }
    }

    /// Associates `code` with `reference_id` and returns the code the
    /// reference ends up with.
    ///
    /// For repeating configurations this is the code already on record if
    /// another request got there first.
    pub fn remember(
        &self,
        config: &SerialConfig,
        reference_id: &str,
        isolation: &str,
        code: String,
    ) -> String {
        let associate = BarCodeAssociate::new(&config.id, isolation, reference_id, code.as_str());
        let result = match config.return_strategy {
            ReturnStrategy::Repeat => self
                .store
                .insert_association_if_absent(associate)
                .map(|kept| kept.bar_code),
            ReturnStrategy::Fresh => self.store.insert_association(associate).map(|()| code.clone()),
        };

        match result {
            Ok(kept) => kept,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%reference_id, "Failed to persist barcode association: {_e}");
                code
            }
        }
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use std::{cell::Cell, sync::Arc};

    use super::*;
    use crate::{ConfigType, MemoryStore, test_support::BrokenStore};

    fn barcode(strategy: ReturnStrategy) -> SerialConfig {
        SerialConfig::new("cfg-bc", "Parcel", ConfigType::Barcode, "BC#{000}", "acme")
            .with_return_strategy(strategy)
    }

    fn issuing<'a>(calls: &'a Cell<u32>) -> impl FnOnce() -> Result<String> + 'a {
        move || {
            calls.set(calls.get() + 1);
            Ok(format!("BC{:03}", calls.get()))
        }
    }

    #[test]
    fn repeat_returns_first_code_without_issuing() {
        let store = Arc::new(MemoryStore::new());
        let policy = BarcodePolicy::new(store.clone());
        let config = barcode(ReturnStrategy::Repeat);
        let calls = Cell::new(0);

        let first = policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();
        let second = policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();

        assert_eq!(first, "BC001");
        assert_eq!(second, "BC001");
        assert_eq!(calls.get(), 1);
        assert_eq!(store.associations().len(), 1);
    }

    #[test]
    fn repeat_is_scoped_by_isolation() {
        let store = Arc::new(MemoryStore::new());
        let policy = BarcodePolicy::new(store);
        let config = barcode(ReturnStrategy::Repeat);
        let calls = Cell::new(0);

        policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();
        let other = policy
            .resolve(&config, "REF-1", "wh-2", issuing(&calls))
            .unwrap();
        assert_eq!(other, "BC002");
    }

    #[test]
    fn fresh_issues_every_time_but_records_each_code() {
        let store = Arc::new(MemoryStore::new());
        let policy = BarcodePolicy::new(store.clone());
        let config = barcode(ReturnStrategy::Fresh);
        let calls = Cell::new(0);

        let first = policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();
        let second = policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();

        assert_eq!((first.as_str(), second.as_str()), ("BC001", "BC002"));
        assert_eq!(store.associations().len(), 2);
    }

    #[test]
    fn losing_a_first_request_race_returns_winner_code() {
        let store = Arc::new(MemoryStore::new());
        let policy = BarcodePolicy::new(store);
        let config = barcode(ReturnStrategy::Repeat);

        assert_eq!(policy.remember(&config, "REF-1", "default", "BC007".into()), "BC007");
        assert_eq!(policy.remember(&config, "REF-1", "default", "BC008".into()), "BC007");
    }

    #[test]
    fn store_failures_still_return_a_code() {
        let policy = BarcodePolicy::new(Arc::new(BrokenStore));
        let config = barcode(ReturnStrategy::Repeat);
        let calls = Cell::new(0);

        let code = policy
            .resolve(&config, "REF-1", "default", issuing(&calls))
            .unwrap();
        assert_eq!(code, "BC001");
    }
}
