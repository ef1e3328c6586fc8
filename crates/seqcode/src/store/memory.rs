use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;

use crate::{BarCodeAssociate, ConfigType, IsolationRecord, SerialConfig, SerialStore, StoreError};

type PartitionKey = (String, String, String);

#[derive(Debug, Default)]
struct Tables {
    configs: HashMap<String, SerialConfig>,
    codes: HashMap<String, BTreeSet<String>>,
    records: HashMap<PartitionKey, IsolationRecord>,
    associations: Vec<BarCodeAssociate>,
}

/// An in-process [`SerialStore`].
///
/// Persisted codes are kept per source so calibration can be exercised
/// without a database: [`insert_code`](Self::insert_code) plays the role of
/// rows written by the business application.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with configurations.
    pub fn with_configs(configs: impl IntoIterator<Item = SerialConfig>) -> Self {
        let store = Self::new();
        store
            .tables
            .lock()
            .configs
            .extend(configs.into_iter().map(|c| (c.id.clone(), c)));
        store
    }

    /// Records a formatted code as persisted in `source`.
    pub fn insert_code(&self, source: &str, code: impl Into<String>) {
        self.tables
            .lock()
            .codes
            .entry(source.to_string())
            .or_default()
            .insert(code.into());
    }

    pub fn isolation_records(&self) -> Vec<IsolationRecord> {
        self.tables.lock().records.values().cloned().collect()
    }

    pub fn associations(&self) -> Vec<BarCodeAssociate> {
        self.tables.lock().associations.clone()
    }
}

fn matches_association(
    a: &BarCodeAssociate,
    config_id: &str,
    isolation: &str,
    reference_id: &str,
) -> bool {
    a.config_id == config_id && a.isolation_code == isolation && a.reference_id == reference_id
}

fn record_key(record: &IsolationRecord) -> PartitionKey {
    (
        record.config_id.clone(),
        record.isolation_code.clone(),
        record.date_string.clone(),
    )
}

impl SerialStore for MemoryStore {
    fn find_config(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
    ) -> Result<Option<SerialConfig>, StoreError> {
        Ok(self
            .tables
            .lock()
            .configs
            .values()
            .find(|c| {
                c.entity_class_name == entity
                    && c.config_type == config_type
                    && c.tenant_code == tenant
            })
            .cloned())
    }

    fn find_config_by_id(&self, id: &str) -> Result<Option<SerialConfig>, StoreError> {
        Ok(self.tables.lock().configs.get(id).cloned())
    }

    fn find_latest_code(&self, source: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .tables
            .lock()
            .codes
            .get(source)
            .and_then(|codes| codes.last().cloned()))
    }

    fn find_isolation_record(
        &self,
        config_id: &str,
        isolation: &str,
        bucket: &str,
    ) -> Result<Option<IsolationRecord>, StoreError> {
        let key = (
            config_id.to_string(),
            isolation.to_string(),
            bucket.to_string(),
        );
        Ok(self.tables.lock().records.get(&key).cloned())
    }

    fn find_association(
        &self,
        config_id: &str,
        isolation: &str,
        reference_id: &str,
    ) -> Result<Option<BarCodeAssociate>, StoreError> {
        Ok(self
            .tables
            .lock()
            .associations
            .iter()
            .rev()
            .find(|a| matches_association(a, config_id, isolation, reference_id))
            .cloned())
    }

    fn save_config(&self, config: SerialConfig) -> Result<SerialConfig, StoreError> {
        self.tables
            .lock()
            .configs
            .insert(config.id.clone(), config.clone());
        Ok(config)
    }

    fn delete_config(&self, id: &str) -> Result<Option<SerialConfig>, StoreError> {
        Ok(self.tables.lock().configs.remove(id))
    }

    fn upsert_isolation_record(&self, record: IsolationRecord) -> Result<(), StoreError> {
        self.tables
            .lock()
            .records
            .entry(record_key(&record))
            .and_modify(|stored| {
                stored.current_number = stored.current_number.max(record.current_number);
            })
            .or_insert(record);
        Ok(())
    }

    fn replace_isolation_record(&self, record: IsolationRecord) -> Result<(), StoreError> {
        self.tables.lock().records.insert(record_key(&record), record);
        Ok(())
    }

    fn delete_isolation_records(&self, config_id: &str) -> Result<usize, StoreError> {
        let mut tables = self.tables.lock();
        let before = tables.records.len();
        tables.records.retain(|(id, _, _), _| id != config_id);
        Ok(before - tables.records.len())
    }

    fn insert_association(&self, associate: BarCodeAssociate) -> Result<(), StoreError> {
        self.tables.lock().associations.push(associate);
        Ok(())
    }

    fn insert_association_if_absent(
        &self,
        associate: BarCodeAssociate,
    ) -> Result<BarCodeAssociate, StoreError> {
        let mut tables = self.tables.lock();
        let existing = tables.associations.iter().find(|a| {
            a.has_code()
                && matches_association(
                    a,
                    &associate.config_id,
                    &associate.isolation_code,
                    &associate.reference_id,
                )
        });
        if let Some(existing) = existing {
            return Ok(existing.clone());
        }
        tables.associations.push(associate.clone());
        Ok(associate)
    }
}
