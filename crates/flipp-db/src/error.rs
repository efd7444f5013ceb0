//! Catalog store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No record of `kind` has this id.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// A statement that always yields a row yielded none.
    #[error("query returned no rows")]
    NoResult,

    /// A stored value does not decode (bad timestamp, negative count).
    #[error("corrupt catalog value: {0}")]
    Corrupt(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    LibSql(#[from] libsql::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
