//! Catalog source matching options.

use serde::{Deserialize, Serialize};

const fn default_tolerance_arcsec() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// A detection within this distance of a catalog source is the same object.
    #[serde(default = "default_tolerance_arcsec")]
    pub tolerance_arcsec: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            tolerance_arcsec: default_tolerance_arcsec(),
        }
    }
}
