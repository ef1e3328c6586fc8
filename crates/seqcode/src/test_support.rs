//! Backends that fail every call.

use core::time::Duration;

use crate::{
    BarCodeAssociate, CacheError, ConfigType, IsolationRecord, SerialConfig, SerialStore,
    SharedCache, StoreError,
};

pub struct BrokenStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::new("store down"))
}

impl SerialStore for BrokenStore {
    fn find_config(&self, _: &str, _: ConfigType, _: &str) -> Result<Option<SerialConfig>, StoreError> {
        down()
    }
    fn find_config_by_id(&self, _: &str) -> Result<Option<SerialConfig>, StoreError> {
        down()
    }
    fn find_latest_code(&self, _: &str) -> Result<Option<String>, StoreError> {
        down()
    }
    fn find_isolation_record(
        &self,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Option<IsolationRecord>, StoreError> {
        down()
    }
    fn find_association(
        &self,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Option<BarCodeAssociate>, StoreError> {
        down()
    }
    fn save_config(&self, _: SerialConfig) -> Result<SerialConfig, StoreError> {
        down()
    }
    fn delete_config(&self, _: &str) -> Result<Option<SerialConfig>, StoreError> {
        down()
    }
    fn upsert_isolation_record(&self, _: IsolationRecord) -> Result<(), StoreError> {
        down()
    }
    fn replace_isolation_record(&self, _: IsolationRecord) -> Result<(), StoreError> {
        down()
    }
    fn delete_isolation_records(&self, _: &str) -> Result<usize, StoreError> {
        down()
    }
    fn insert_association(&self, _: BarCodeAssociate) -> Result<(), StoreError> {
        down()
    }
    fn insert_association_if_absent(
        &self,
        _: BarCodeAssociate,
    ) -> Result<BarCodeAssociate, StoreError> {
        down()
    }
}

pub struct BrokenCache;

fn unreachable_cache<T>() -> Result<T, CacheError> {
    Err(CacheError::new("cache unreachable"))
}

impl SharedCache for BrokenCache {
    fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
        unreachable_cache()
    }
    fn set(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), CacheError> {
        unreachable_cache()
    }
    fn delete(&self, _: &[String]) -> Result<usize, CacheError> {
        unreachable_cache()
    }
    fn exists(&self, _: &str) -> Result<bool, CacheError> {
        unreachable_cache()
    }
    fn increment(&self, _: &str) -> Result<u64, CacheError> {
        unreachable_cache()
    }
    fn increment_if_exists(&self, _: &str) -> Result<Option<u64>, CacheError> {
        unreachable_cache()
    }
    fn set_if_absent(&self, _: &str, _: u64, _: Option<Duration>) -> Result<bool, CacheError> {
        unreachable_cache()
    }
    fn keys_matching(&self, _: &str) -> Result<Vec<String>, CacheError> {
        unreachable_cache()
    }
}
