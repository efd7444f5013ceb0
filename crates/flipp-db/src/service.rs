//! Service layer hosting the catalog repositories.
//!
//! `CatalogService` wraps `FlippDb`. All repo methods are implemented as
//! `impl CatalogService` in `repos/*.rs`.
//!
//! Writes are issued one row at a time. The read-check-then-write sequences
//! used by the matcher are not wrapped in a transaction; the unique indexes
//! on `images` and `observations` reject duplicates if two writers race.

use serde::Serialize;

use crate::FlippDb;
use crate::error::DatabaseError;

/// Row counts for the three record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub sources: u64,
    pub images: u64,
    pub observations: u64,
}

pub struct CatalogService {
    db: FlippDb,
}

impl CatalogService {
    /// Open a service over a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = FlippDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `FlippDb`.
    #[must_use]
    pub const fn from_db(db: FlippDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &FlippDb {
        &self.db
    }

    /// Counts of sources, images and observations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any count query fails.
    pub async fn catalog_stats(&self) -> Result<CatalogStats, DatabaseError> {
        Ok(CatalogStats {
            sources: self.count_sources().await?,
            images: self.count_images().await?,
            observations: self.count_observations().await?,
        })
    }
}
