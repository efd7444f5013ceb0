//! Astrometric solver (`solve-field`) options.

use serde::{Deserialize, Serialize};

fn default_command() -> String {
    "solve-field".to_string()
}

/// Default solver wall-clock limit in seconds.
const fn default_timeout_secs() -> u64 {
    60
}

/// Default search radius around the header pointing, degrees.
const fn default_search_radius_deg() -> f64 {
    0.3
}

const fn default_tweak_order() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverConfig {
    /// Executable name or path.
    #[serde(default = "default_command")]
    pub command: String,

    /// Seconds before a running solve is abandoned.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `--radius` passed alongside the header RA/Dec hint.
    #[serde(default = "default_search_radius_deg")]
    pub search_radius_deg: f64,

    /// `--tweak-order` for the SIP distortion fit.
    #[serde(default = "default_tweak_order")]
    pub tweak_order: u32,

    /// Optional `--backend-config` (astrometry.cfg) path.
    #[serde(default)]
    pub backend_config: Option<String>,

    /// Optional `--source-extractor-path` forwarded to the solver.
    #[serde(default)]
    pub extractor_path: Option<String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_secs: default_timeout_secs(),
            search_radius_deg: default_search_radius_deg(),
            tweak_order: default_tweak_order(),
            backend_config: None,
            extractor_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SolverConfig::default();
        assert_eq!(config.command, "solve-field");
        assert_eq!(config.timeout_secs, 60);
        assert!((config.search_radius_deg - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.tweak_order, 2);
        assert!(config.backend_config.is_none());
    }
}
