use std::{fs, path::Path};

use anyhow::Context;
use seqcode::{BarCodeAssociate, IsolationRecord, MemoryStore, SerialConfig, SerialStore};
use serde::{Deserialize, Serialize};

/// What the binary persists between runs.
///
/// `configs` is required. `records` and `associations` are the durable state
/// a previous run left behind, so counters calibrate where that run stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateFile {
    pub configs: Vec<SerialConfig>,
    #[serde(default)]
    pub records: Vec<IsolationRecord>,
    #[serde(default)]
    pub associations: Vec<BarCodeAssociate>,
}

impl StateFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read state file `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse state file `{}`", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .with_context(|| format!("failed to write state file `{}`", path.display()))
    }

    /// Builds a store holding everything in this file.
    pub fn into_store(self) -> anyhow::Result<MemoryStore> {
        let store = MemoryStore::with_configs(self.configs);
        for record in self.records {
            store.upsert_isolation_record(record)?;
        }
        for associate in self.associations {
            store.insert_association(associate)?;
        }
        Ok(store)
    }

    /// Captures the durable state of `store` next to `configs`.
    pub fn capture(configs: Vec<SerialConfig>, store: &MemoryStore) -> Self {
        let mut records = store.isolation_records();
        records.sort_by(|a, b| {
            (&a.config_id, &a.isolation_code, &a.date_string).cmp(&(
                &b.config_id,
                &b.isolation_code,
                &b.date_string,
            ))
        });
        Self {
            configs,
            records,
            associations: store.associations(),
        }
    }
}
