use serde::{Deserialize, Serialize};

/// Isolation code used when a caller does not partition its counter.
pub const DEFAULT_ISOLATION: &str = "default";

/// Durable snapshot of the last number issued for one partition.
///
/// Keyed by (`config_id`, `isolation_code`, `date_string`). The record lags the
/// cached counter: it is written asynchronously after issuance and only read
/// back to calibrate a cold counter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsolationRecord {
    pub config_id: String,
    pub isolation_code: String,
    /// Bucket key of the cycle the number belongs to. Empty for unbounded
    /// counters.
    #[serde(default)]
    pub date_string: String,
    pub current_number: u64,
}

impl IsolationRecord {
    pub fn new(
        config_id: impl Into<String>,
        isolation_code: impl Into<String>,
        date_string: impl Into<String>,
        current_number: u64,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            isolation_code: isolation_code.into(),
            date_string: date_string.into(),
            current_number,
        }
    }
}

/// Link between a business reference and the barcode issued for it.
///
/// Written once and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarCodeAssociate {
    pub config_id: String,
    pub isolation_code: String,
    pub reference_id: String,
    pub bar_code: String,
}

impl BarCodeAssociate {
    pub fn new(
        config_id: impl Into<String>,
        isolation_code: impl Into<String>,
        reference_id: impl Into<String>,
        bar_code: impl Into<String>,
    ) -> Self {
        Self {
            config_id: config_id.into(),
            isolation_code: isolation_code.into(),
            reference_id: reference_id.into(),
            bar_code: bar_code.into(),
        }
    }

    pub fn has_code(&self) -> bool {
        !self.bar_code.trim().is_empty()
    }
}
