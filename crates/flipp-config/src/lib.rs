//! # flipp-config
//!
//! Layered configuration loading for flipp using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FLIPP_*` prefix, `__` as separator)
//! 2. An explicit file (`--config` or `FLIPP_CONF`)
//! 3. Project-level `./flipp.toml`
//! 4. User-level `~/.config/flipp/config.toml`
//! 5. Built-in defaults (including the stock `kait` and `nickel` telescopes)
//!
//! # Environment Variable Mapping
//!
//! Figment maps `FLIPP_MATCHING__TOLERANCE_ARCSEC` -> `matching.tolerance_arcsec`,
//! `FLIPP_TELESCOPES__KAIT__PIXEL_SCALE_LOW` -> `telescopes.kait.pixel_scale_low`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use flipp_config::FlippConfig;
//!
//! let config = FlippConfig::load_with_dotenv(None).expect("config");
//! let kait = config.telescope("kait").expect("stock telescope");
//! println!("KAIT pixel scale: {}", kait.options().pixel_scale_low);
//! ```

mod calibration;
mod catalog;
mod database;
mod error;
mod extractor;
mod matching;
mod pipeline;
mod solver;
mod telescope;

pub use calibration::CalibrationConfig;
pub use catalog::CatalogConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use extractor::ExtractorConfig;
pub use matching::MatchingConfig;
pub use pipeline::PipelineConfig;
pub use solver::SolverConfig;
pub use telescope::{HeaderMap, Telescope, TelescopeOptions};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "FLIPP_CONF";

fn default_telescopes() -> BTreeMap<String, Telescope> {
    BTreeMap::from([
        ("kait".to_string(), Telescope::kait()),
        ("nickel".to_string(), Telescope::nickel()),
    ])
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlippConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default = "default_telescopes")]
    pub telescopes: BTreeMap<String, Telescope>,
}

impl Default for FlippConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            solver: SolverConfig::default(),
            extractor: ExtractorConfig::default(),
            catalog: CatalogConfig::default(),
            calibration: CalibrationConfig::default(),
            matching: MatchingConfig::default(),
            pipeline: PipelineConfig::default(),
            telescopes: default_telescopes(),
        }
    }
}

impl FlippConfig {
    /// Load configuration from all sources and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction or validation fails.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction or validation fails.
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from("flipp.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit file
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file_exact(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment = figment.merge(Env::prefixed("FLIPP_").split("__"));

        figment
    }

    /// Check every section whose values the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::InvalidValue` or `NotConfigured` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telescopes.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "telescopes".into(),
            });
        }
        for (name, telescope) in &self.telescopes {
            telescope.validate(name)?;
        }

        positive(
            "matching.tolerance_arcsec",
            self.matching.tolerance_arcsec,
        )?;
        positive(
            "calibration.crossmatch_tolerance_arcsec",
            self.calibration.crossmatch_tolerance_arcsec,
        )?;
        positive(
            "calibration.max_field_radius_deg",
            self.calibration.max_field_radius_deg,
        )?;
        if !(self.calibration.field_margin_deg.is_finite() && self.calibration.field_margin_deg >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "calibration.field_margin_deg".into(),
                reason: "must be zero or positive".into(),
            });
        }
        if self.calibration.min_matches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "calibration.min_matches".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.solver.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solver.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        positive("solver.search_radius_deg", self.solver.search_radius_deg)?;
        if self.pipeline.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.extensions".into(),
                reason: "at least one extension is required".into(),
            });
        }
        Ok(())
    }

    /// Look up a configured telescope by name (case-insensitive).
    #[must_use]
    pub fn telescope(&self, name: &str) -> Option<&Telescope> {
        self.telescopes.get(&name.trim().to_ascii_lowercase()).or_else(|| {
            self.telescopes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
                .map(|(_, telescope)| telescope)
        })
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flipp").join("config.toml"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            reason: format!("must be positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FlippConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.telescopes.len(), 2);
        assert!((config.matching.tolerance_arcsec - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.calibration.min_matches, 3);
        assert!(!config.calibration.include_transform_error);
    }

    #[test]
    fn telescope_lookup_ignores_case() {
        let config = FlippConfig::default();
        assert_eq!(config.telescope("KAIT").map(Telescope::kind), Some("kait"));
        assert_eq!(config.telescope(" nickel ").map(Telescope::kind), Some("nickel"));
        assert!(config.telescope("keck").is_none());
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let mut config = FlippConfig::default();
        config.matching.tolerance_arcsec = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "matching.tolerance_arcsec"));
    }

    #[test]
    fn empty_telescope_table_is_not_configured() {
        let mut config = FlippConfig::default();
        config.telescopes.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotConfigured { .. })
        ));
    }
}
