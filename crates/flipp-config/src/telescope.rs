//! Telescope variants and their instrument-specific options.
//!
//! The set of telescope kinds is closed. Each entry in the `[telescopes]`
//! table carries a `kind` tag plus its pixel-scale bounds and header-field
//! mapping:
//!
//! ```toml
//! [telescopes.kait]
//! kind = "kait"
//! code = "k"
//! pixel_scale_low = 0.79
//! pixel_scale_high = 0.80
//! instrument_match = ["K.A.I.T."]
//!
//! [telescopes.kait.header]
//! filter = "filters"
//! date = "date-obs"
//! time = "ut"
//! date_format = "%d/%m/%Y"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_object_key() -> String {
    "object".to_string()
}

fn default_ra_key() -> String {
    "ra".to_string()
}

fn default_dec_key() -> String {
    "dec".to_string()
}

fn default_instrument_key() -> String {
    "instrume".to_string()
}

/// Header keywords holding each normalized metadata field.
///
/// Keywords are matched case-insensitively against the image header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderMap {
    pub filter: String,
    pub date: String,
    /// Separate UT time keyword; `None` when `date` already carries the time.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default = "default_object_key")]
    pub object: String,
    #[serde(default = "default_ra_key")]
    pub ra: String,
    #[serde(default = "default_dec_key")]
    pub dec: String,
    #[serde(default = "default_instrument_key")]
    pub instrument: String,
    /// `chrono` format of the `date` value, tried before the ISO fallbacks.
    #[serde(default)]
    pub date_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TelescopeOptions {
    /// Single-letter code used in output file names.
    pub code: String,
    /// Lower pixel-scale bound for the solver, arcsec/pixel.
    pub pixel_scale_low: f64,
    /// Upper pixel-scale bound for the solver, arcsec/pixel.
    pub pixel_scale_high: f64,
    /// Substrings of the instrument keyword that identify this telescope.
    #[serde(default)]
    pub instrument_match: Vec<String>,
    pub header: HeaderMap,
}

/// A configured telescope.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Telescope {
    Kait(TelescopeOptions),
    Nickel(TelescopeOptions),
    Custom(TelescopeOptions),
}

impl Telescope {
    /// The Katzman Automatic Imaging Telescope with its stock header layout.
    #[must_use]
    pub fn kait() -> Self {
        Self::Kait(TelescopeOptions {
            code: "k".into(),
            pixel_scale_low: 0.79,
            pixel_scale_high: 0.80,
            instrument_match: vec!["K.A.I.T.".into()],
            header: HeaderMap {
                filter: "filters".into(),
                date: "date-obs".into(),
                time: Some("ut".into()),
                object: default_object_key(),
                ra: default_ra_key(),
                dec: default_dec_key(),
                instrument: default_instrument_key(),
                date_format: Some("%d/%m/%Y".into()),
            },
        })
    }

    /// The Lick Nickel 1-m with its stock header layout.
    #[must_use]
    pub fn nickel() -> Self {
        Self::Nickel(TelescopeOptions {
            code: "n".into(),
            pixel_scale_low: 0.36,
            pixel_scale_high: 0.38,
            instrument_match: vec!["Nickel".into()],
            header: HeaderMap {
                filter: "filtnam".into(),
                date: "date-obs".into(),
                time: Some("utmiddle".into()),
                object: default_object_key(),
                ra: default_ra_key(),
                dec: default_dec_key(),
                instrument: default_instrument_key(),
                date_format: Some("%d/%m/%y".into()),
            },
        })
    }

    #[must_use]
    pub const fn options(&self) -> &TelescopeOptions {
        match self {
            Self::Kait(options) | Self::Nickel(options) | Self::Custom(options) => options,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Kait(_) => "kait",
            Self::Nickel(_) => "nickel",
            Self::Custom(_) => "custom",
        }
    }

    /// Whether an instrument header value identifies this telescope.
    #[must_use]
    pub fn matches_instrument(&self, instrument: &str) -> bool {
        let instrument = instrument.trim().to_ascii_lowercase();
        self.options()
            .instrument_match
            .iter()
            .any(|needle| !needle.is_empty() && instrument.contains(&needle.to_ascii_lowercase()))
    }

    /// Check required fields and scale bounds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let options = self.options();
        let field = |f: &str| format!("telescopes.{name}.{f}");

        if options.code.trim().is_empty() {
            return Err(ConfigError::invalid(field("code"), "must not be empty"));
        }
        let (low, high) = (options.pixel_scale_low, options.pixel_scale_high);
        if !(low.is_finite() && low > 0.0) {
            return Err(ConfigError::invalid(
                field("pixel_scale_low"),
                format!("must be positive, got {low}"),
            ));
        }
        if !(high.is_finite() && high >= low) {
            return Err(ConfigError::invalid(
                field("pixel_scale_high"),
                format!("must be >= pixel_scale_low ({low}), got {high}"),
            ));
        }

        let header = &options.header;
        for (key, value) in [
            ("header.filter", &header.filter),
            ("header.date", &header.date),
            ("header.object", &header.object),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field(key), "header keyword must not be empty"));
            }
        }
        Ok(())
    }
}
