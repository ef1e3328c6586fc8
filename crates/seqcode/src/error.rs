//! Error types for number issuance.
//!
//! [`Error`] is what callers of the issuance and management operations see.
//! Backends report failures through the narrower [`CacheError`] and
//! [`StoreError`], which convert into [`Error::CacheUnavailable`] and
//! [`Error::StoreUnavailable`].
//!
//! Not every backend failure surfaces. Calibration reads and association
//! lookups degrade to "absent" so numbering stays available, and a cache that
//! cannot be reached pushes issuance onto the uncoordinated fallback path.

use crate::{ConfigType, TemplateError};

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors a request can fail with.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No configuration exists for the coordinate.
    #[error("no {config_type} configuration for `{entity}` under tenant `{tenant}`")]
    ConfigNotFound {
        entity: String,
        config_type: ConfigType,
        tenant: String,
    },

    /// The configuration exists but is switched off.
    #[error("configuration `{id}` is deactivated")]
    ConfigDisabled { id: String },

    /// The request carried no usable tenant.
    #[error("no valid tenant on the request")]
    TenantNotResolved,

    /// The configured expression could not be parsed.
    #[error("invalid template `{template}`: {reason}")]
    InvalidTemplate {
        template: String,
        reason: TemplateError,
    },

    /// A named parameter was absent under [`ParamPolicy::Strict`].
    ///
    /// [`ParamPolicy::Strict`]: crate::ParamPolicy::Strict
    #[error("template parameter `{name}` was not supplied")]
    MissingParameter { name: String },

    /// The system of record could not be read or written.
    #[error("durable store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The shared cache could not be reached.
    #[error("shared cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),

    /// The partition has never issued a number in the current bucket.
    #[error("no issued numbers for config `{config_id}`, isolation `{isolation}`, bucket `{bucket}`")]
    RecordNotFound {
        config_id: String,
        isolation: String,
        bucket: String,
    },

    /// A payload failed to encode.
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Failure reported by a [`SharedCache`](crate::SharedCache) backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CacheError {
    message: String,
}

impl CacheError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a [`SerialStore`](crate::SerialStore) backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Why a serial number could not be read back out of a persisted code.
///
/// Only logged. Calibration falls through to the configured value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CalibrationError {
    /// The serial field's position in the code cannot be determined.
    #[error("cannot locate a {width}-digit serial field in `{code}`")]
    Unlocatable { code: String, width: usize },

    /// The located field is not a base-10 integer.
    #[error("serial field `{digits}` of `{code}` is not numeric")]
    NotNumeric { code: String, digits: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_convert_into_request_errors() {
        let err: Error = StoreError::new("connection refused").into();
        assert_eq!(err.to_string(), "durable store unavailable: connection refused");

        let err: Error = CacheError::new("timeout").into();
        assert!(matches!(err, Error::CacheUnavailable(ref e) if e.message() == "timeout"));
    }

    #[test]
    fn config_not_found_names_the_coordinate() {
        let err = Error::ConfigNotFound {
            entity: "com.acme.Order".to_string(),
            config_type: ConfigType::Number,
            tenant: "acme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no NUMBER configuration for `com.acme.Order` under tenant `acme`"
        );
    }
}
