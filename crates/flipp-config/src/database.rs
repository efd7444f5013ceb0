//! Catalog store location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL catalog file. Empty means the per-user data dir.
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    /// Resolved catalog path: the configured one, else
    /// `<data_dir>/flipp/catalog.db`, else `./flipp-catalog.db`.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        if !self.path.is_empty() {
            return PathBuf::from(&self.path);
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from("flipp-catalog.db"),
            |dir| dir.join("flipp").join("catalog.db"),
        )
    }
}
