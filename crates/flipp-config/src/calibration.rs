//! Zeropoint calibration options.

use serde::{Deserialize, Serialize};

const fn default_crossmatch_tolerance_arcsec() -> f64 {
    10.0
}

const fn default_min_matches() -> usize {
    3
}

/// Margin added to the detection spread when sizing the catalog query.
const fn default_field_margin_deg() -> f64 {
    0.05
}

/// Anything wider than this is treated as a broken solution.
const fn default_max_field_radius_deg() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalibrationConfig {
    /// Detection to reference-star cross-match radius.
    #[serde(default = "default_crossmatch_tolerance_arcsec")]
    pub crossmatch_tolerance_arcsec: f64,

    /// Fewest cross-matched stars that still yield a zeropoint.
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,

    #[serde(default = "default_field_margin_deg")]
    pub field_margin_deg: f64,

    #[serde(default = "default_max_field_radius_deg")]
    pub max_field_radius_deg: f64,

    /// Fold the passband transform's systematic error into every
    /// calibrated magnitude error (quadrature sum).
    #[serde(default)]
    pub include_transform_error: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            crossmatch_tolerance_arcsec: default_crossmatch_tolerance_arcsec(),
            min_matches: default_min_matches(),
            field_margin_deg: default_field_margin_deg(),
            max_field_radius_deg: default_max_field_radius_deg(),
            include_transform_error: false,
        }
    }
}
