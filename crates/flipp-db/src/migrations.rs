//! Embedded schema migrations.
//!
//! Applied in order on open. `PRAGMA user_version` records the last one
//! applied, and every statement is `IF NOT EXISTS`, so re-running a
//! migration against an existing file is harmless.

use crate::FlippDb;
use crate::error::DatabaseError;

/// `(version, name, sql)`, ascending by version.
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "initial",
    include_str!("../migrations/001_initial.sql"),
)];

impl FlippDb {
    pub(crate) async fn schema_version(&self) -> Result<i64, DatabaseError> {
        let mut rows = self.conn.query("PRAGMA user_version", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    /// Apply every migration newer than the stored schema version.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let current = self.schema_version().await?;
        for &(version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
            self.conn
                .execute_batch(sql)
                .await
                .map_err(|e| DatabaseError::Migration(format!("{version:03}_{name}: {e}")))?;
            // PRAGMA takes no bound parameters.
            self.conn
                .execute(&format!("PRAGMA user_version = {version}"), ())
                .await
                .map_err(|e| DatabaseError::Migration(format!("recording version {version}: {e}")))?;
            tracing::debug!(version, name, "migration applied");
        }
        Ok(())
    }

    /// Re-run every migration regardless of the stored version.
    #[cfg(test)]
    pub(crate) async fn rerun_all_migrations(&self) -> Result<(), DatabaseError> {
        for &(_, _, sql) in MIGRATIONS {
            self.conn.execute_batch(sql).await?;
        }
        Ok(())
    }
}
