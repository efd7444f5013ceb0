//! Errors raised by core types. Store, catalog and pipeline errors wrap
//! these in their own enums.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A value outside its domain, e.g. a declination beyond ±90°.
    #[error("invalid value: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
