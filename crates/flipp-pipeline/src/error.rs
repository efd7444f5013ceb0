//! Pipeline error types.

use flipp_db::error::DatabaseError;
use flipp_refcat::CatalogError;
use thiserror::Error;

/// Errors raised while processing one image.
///
/// The first three variants describe a bad image and are expected during a
/// night's run. Everything else points at the environment (store, catalog
/// service, external tools) and is reported with its full cause chain.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The image failed the preliminary checks (header fields, source count).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The solver produced no solution or ran out of time.
    #[error("astrometry failed: {reason}")]
    AstrometryFailed { reason: String },

    /// The image is well-formed but cannot be calibrated.
    #[error("image failed: {0}")]
    ImageFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("reference catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An external tool could not be run or returned unreadable output.
    #[error("external tool error: {0}")]
    Tool(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Whether this failure is a classified per-image failure that is
    /// logged and skipped.
    #[must_use]
    pub const fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::AstrometryFailed { .. } | Self::ImageFailed(_)
        )
    }

    pub(crate) fn astrometry(reason: impl Into<String>) -> Self {
        Self::AstrometryFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classified_failures_are_skippable() {
        assert!(PipelineError::Validation("x".into()).is_skippable());
        assert!(PipelineError::astrometry("timeout").is_skippable());
        assert!(PipelineError::ImageFailed("x".into()).is_skippable());
    }

    #[test]
    fn environment_failures_are_not_skippable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!PipelineError::Io(io).is_skippable());
        assert!(!PipelineError::Tool("sex".into()).is_skippable());
        assert!(!PipelineError::Database(DatabaseError::NoResult).is_skippable());
        assert!(!PipelineError::Other(anyhow::anyhow!("boom")).is_skippable());
    }
}
