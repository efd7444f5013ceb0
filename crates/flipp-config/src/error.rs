//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer failed to parse or does not fit the schema.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A section that must be present was left empty.
    #[error("'{section}' is not configured")]
    NotConfigured { section: String },

    #[error("invalid '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
