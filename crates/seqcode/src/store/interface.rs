use crate::{BarCodeAssociate, ConfigType, IsolationRecord, SerialConfig, StoreError};

/// The relational system of record, reached through simple finder queries.
///
/// The issuance hot path only reads. Writes come from the management
/// operations, the barcode association step, and whichever collaborator
/// drains published [`IsolationRecord`] snapshots.
pub trait SerialStore: Send + Sync {
    fn find_config(
        &self,
        entity: &str,
        config_type: ConfigType,
        tenant: &str,
    ) -> Result<Option<SerialConfig>, StoreError>;

    fn find_config_by_id(&self, id: &str) -> Result<Option<SerialConfig>, StoreError>;

    /// Returns the highest formatted code persisted in `source`.
    ///
    /// `source` is a configuration's
    /// [`calibration_source`](SerialConfig::calibration_source).
    fn find_latest_code(&self, source: &str) -> Result<Option<String>, StoreError>;

    fn find_isolation_record(
        &self,
        config_id: &str,
        isolation: &str,
        bucket: &str,
    ) -> Result<Option<IsolationRecord>, StoreError>;

    fn find_association(
        &self,
        config_id: &str,
        isolation: &str,
        reference_id: &str,
    ) -> Result<Option<BarCodeAssociate>, StoreError>;

    /// Inserts or replaces a configuration by id.
    fn save_config(&self, config: SerialConfig) -> Result<SerialConfig, StoreError>;

    /// Removes a configuration, returning it if it existed.
    fn delete_config(&self, id: &str) -> Result<Option<SerialConfig>, StoreError>;

    /// Inserts the record for its partition and bucket, or raises the stored
    /// `current_number` to the record's. A lower number never replaces a
    /// higher one, so snapshots may be applied in any order.
    fn upsert_isolation_record(&self, record: IsolationRecord) -> Result<(), StoreError>;

    /// Inserts or overwrites the record for its partition and bucket, even
    /// when that lowers `current_number`.
    fn replace_isolation_record(&self, record: IsolationRecord) -> Result<(), StoreError>;

    /// Removes every isolation record of a configuration.
    fn delete_isolation_records(&self, config_id: &str) -> Result<usize, StoreError>;

    /// Appends an association unconditionally.
    fn insert_association(&self, associate: BarCodeAssociate) -> Result<(), StoreError>;

    /// Inserts `associate` unless the reference already has a non-empty code
    /// under the same configuration and isolation, atomically.
    ///
    /// Returns whichever association is on record afterwards.
    fn insert_association_if_absent(
        &self,
        associate: BarCodeAssociate,
    ) -> Result<BarCodeAssociate, StoreError>;
}
