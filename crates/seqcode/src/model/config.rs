use core::fmt;

use serde::{Deserialize, Serialize};

/// Which family of codes a [`SerialConfig`] produces.
///
/// A single entity type may carry one configuration of each kind per tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigType {
    /// Document and order numbers.
    #[serde(alias = "NUMBER_TYPE")]
    Number,
    /// Barcodes, optionally associated with a business reference.
    #[serde(alias = "BAR_TYPE")]
    Barcode,
}

impl ConfigType {
    /// The stable name used in cache keys and serialized payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Barcode => "BARCODE",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a counter restarts.
///
/// Each strategy maps the current time onto a bucket key; counters are scoped
/// to a bucket, so a new bucket starts a fresh counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStrategy {
    /// One counter forever. Rolls over to 1 once it outgrows the serial field.
    #[default]
    #[serde(alias = "MAX_CYCLE")]
    Unbounded,
    /// A counter per calendar year.
    #[serde(alias = "YEAR_CYCLE")]
    Yearly,
    /// A counter per calendar month.
    #[serde(alias = "MONTH_CYCLE")]
    Monthly,
}

/// What a barcode request returns for a reference that already has a code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStrategy {
    /// Always issue a new code.
    #[default]
    Fresh,
    /// Hand back the code previously associated with the reference.
    Repeat,
}

/// Per entity type, per tenant numbering rule.
///
/// `expression_config` is the template the counter is rendered into, e.g.
/// `"ORD${YYYY}#{0000}"`. See [`Template`](crate::Template) for the syntax.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialConfig {
    pub id: String,
    pub entity_class_name: String,
    pub config_type: ConfigType,
    pub expression_config: String,
    #[serde(default)]
    pub cycle_strategy: CycleStrategy,
    /// Render `current_serial` as-is instead of advancing a counter.
    #[serde(default)]
    pub gen_flag: bool,
    /// First number a partition issues when no durable state exists yet.
    #[serde(default)]
    pub initial_serial: u64,
    /// Last number considered issued when no durable state exists yet.
    #[serde(default)]
    pub current_serial: u64,
    #[serde(default)]
    pub return_strategy: ReturnStrategy,
    pub tenant_code: String,
    #[serde(default = "default_activated")]
    pub activated: bool,
    /// Table or query holding previously persisted codes for this entity.
    ///
    /// Calibration reads the highest code from here when no counter is
    /// cached. Falls back to `entity_class_name` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
}

const fn default_activated() -> bool {
    true
}

impl SerialConfig {
    /// Creates an active [`CycleStrategy::Unbounded`] configuration with both
    /// serials at zero.
    pub fn new(
        id: impl Into<String>,
        entity_class_name: impl Into<String>,
        config_type: ConfigType,
        expression_config: impl Into<String>,
        tenant_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_class_name: entity_class_name.into(),
            config_type,
            expression_config: expression_config.into(),
            cycle_strategy: CycleStrategy::default(),
            gen_flag: false,
            initial_serial: 0,
            current_serial: 0,
            return_strategy: ReturnStrategy::default(),
            tenant_code: tenant_code.into(),
            activated: true,
            source_table: None,
        }
    }

    #[must_use]
    pub fn with_cycle(mut self, cycle_strategy: CycleStrategy) -> Self {
        self.cycle_strategy = cycle_strategy;
        self
    }

    #[must_use]
    pub fn with_return_strategy(mut self, return_strategy: ReturnStrategy) -> Self {
        self.return_strategy = return_strategy;
        self
    }

    #[must_use]
    pub fn with_serials(mut self, initial_serial: u64, current_serial: u64) -> Self {
        self.initial_serial = initial_serial;
        self.current_serial = current_serial;
        self
    }

    #[must_use]
    pub fn with_gen_flag(mut self, gen_flag: bool) -> Self {
        self.gen_flag = gen_flag;
        self
    }

    #[must_use]
    pub fn with_source_table(mut self, source_table: impl Into<String>) -> Self {
        self.source_table = Some(source_table.into());
        self
    }

    /// The "last issued" value calibration falls back to when neither a
    /// record nor a persisted code exists.
    ///
    /// Numbering resumes after `current_serial` but never starts below
    /// `initial_serial`.
    pub const fn configured_last_issued(&self) -> u64 {
        let floor = self.initial_serial.saturating_sub(1);
        if self.current_serial > floor {
            self.current_serial
        } else {
            floor
        }
    }

    /// Where calibration looks for the latest persisted code.
    pub fn calibration_source(&self) -> &str {
        self.source_table
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.entity_class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_legacy_enum_names_and_defaults() {
        let json = r#"{
            "id": "cfg-1",
            "entityClassName": "com.acme.Order",
            "configType": "BAR_TYPE",
            "expressionConfig": "ORD${YYYY}#{0000}",
            "cycleStrategy": "YEAR_CYCLE",
            "tenantCode": "acme"
        }"#;
        let config: SerialConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.config_type, ConfigType::Barcode);
        assert_eq!(config.cycle_strategy, CycleStrategy::Yearly);
        assert_eq!(config.return_strategy, ReturnStrategy::Fresh);
        assert!(config.activated);
        assert!(!config.gen_flag);
        assert_eq!(config.current_serial, 0);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let config = SerialConfig::new("cfg-1", "Order", ConfigType::Number, "#{000}", "acme")
            .with_cycle(CycleStrategy::Monthly);
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["entityClassName"], "Order");
        assert_eq!(value["cycleStrategy"], "MONTHLY");
        assert_eq!(value["configType"], "NUMBER");
        assert!(value.get("sourceTable").is_none());
    }

    #[test]
    fn initial_serial_is_the_first_configured_number() {
        let config = SerialConfig::new("cfg-1", "Order", ConfigType::Number, "#{000}", "acme");
        assert_eq!(config.configured_last_issued(), 0);
        assert_eq!(config.clone().with_serials(100, 0).configured_last_issued(), 99);
        assert_eq!(config.clone().with_serials(100, 250).configured_last_issued(), 250);
        assert_eq!(config.with_serials(0, 7).configured_last_issued(), 7);
    }

    #[test]
    fn calibration_source_falls_back_to_entity_name() {
        let config = SerialConfig::new("cfg-1", "Order", ConfigType::Number, "#{000}", "acme");
        assert_eq!(config.calibration_source(), "Order");

        let config = config.with_source_table("t_order");
        assert_eq!(config.calibration_source(), "t_order");

        let config = config.with_source_table("  ");
        assert_eq!(config.calibration_source(), "Order");
    }
}
