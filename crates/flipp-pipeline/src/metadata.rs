//! Telescope-specific header normalization.
//!
//! Each telescope names its filter, date and object keywords differently;
//! [`normalize`] maps them onto one [`ImageMetadata`] shape and derives the
//! output naming scheme from it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use flipp_config::{FlippConfig, HeaderMap, Telescope};
use flipp_core::enums::Passband;
use serde::Serialize;

use crate::error::PipelineError;
use crate::fits::FitsHeader;

/// Header keyword checked after the telescope's own instrument keyword.
const TELESCOPE_KEYWORD: &str = "telescop";

/// Always tried after a telescope's configured date format.
const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";
const TIME_OF_DAY: &str = "%H:%M:%S";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Every header keyword any configured telescope reads, for
/// [`FitsHeader::read`].
#[must_use]
pub fn header_keywords(config: &FlippConfig) -> Vec<String> {
    let mut keywords = vec![TELESCOPE_KEYWORD.to_string()];
    for telescope in config.telescopes.values() {
        let map = &telescope.options().header;
        keywords.extend(
            [&map.filter, &map.date, &map.object, &map.ra, &map.dec, &map.instrument]
                .into_iter()
                .chain(map.time.as_ref())
                .cloned(),
        );
    }
    keywords.sort_unstable_by_key(|k| k.to_ascii_uppercase());
    keywords.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    keywords
}

/// Normalized metadata for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    /// Configured telescope name (the `[telescopes]` key).
    pub telescope: String,
    /// Single-letter telescope code used in file names.
    pub code: String,
    pub passband: Passband,
    /// Target name as written in the header.
    pub target: String,
    /// Start of exposure, UTC, whole seconds.
    pub observed_at: NaiveDateTime,
    pub mjd: f64,
    /// Pointing hint `(ra, dec)` as written in the header.
    pub pointing: Option<(String, String)>,
    pub pixel_scale_low: f64,
    pub pixel_scale_high: f64,
    /// The header already carries a WCS solution.
    pub has_wcs: bool,
}

impl ImageMetadata {
    /// `<target>_<YYYYMMDD><.ffff>_<code>_<filter>`.
    #[must_use]
    pub fn frame_id(&self) -> String {
        let target: String = self
            .target
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '_' { '-' } else { c })
            .collect::<String>()
            .to_lowercase();
        format!(
            "{target}_{}{}_{}_{}",
            self.observed_at.format("%Y%m%d"),
            fractional_day(self.observed_at.time()),
            self.code,
            self.passband
        )
    }

    /// File name of the solved image.
    #[must_use]
    pub fn output_file_name(&self) -> String {
        format!("{}_cal.fit", self.frame_id())
    }

    /// Per-night directory under the output root.
    #[must_use]
    pub fn output_subdir(&self) -> String {
        self.observed_at.format("%Y%m%d").to_string()
    }
}

/// Pick the telescope for an image.
///
/// An explicit name must be configured. Without one, the telescope is
/// inferred from the instrument or telescope keyword.
///
/// # Errors
///
/// `PipelineError::Validation` when the name is unknown or nothing matches.
pub fn resolve_telescope<'a>(
    header: &FitsHeader,
    config: &'a FlippConfig,
    explicit: Option<&str>,
) -> Result<(&'a str, &'a Telescope), PipelineError> {
    if let Some(name) = explicit {
        return config
            .telescopes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
            .map(|(key, telescope)| (key.as_str(), telescope))
            .ok_or_else(|| PipelineError::Validation(format!("unknown telescope '{name}'")));
    }

    for (name, telescope) in &config.telescopes {
        let instrument_key = telescope.options().header.instrument.as_str();
        let matched = [instrument_key, TELESCOPE_KEYWORD]
            .iter()
            .filter_map(|key| header.text(key))
            .any(|value| telescope.matches_instrument(&value));
        if matched {
            tracing::debug!(telescope = %name, "telescope inferred from header");
            return Ok((name.as_str(), telescope));
        }
    }

    Err(PipelineError::Validation(
        "cannot infer telescope from header; pass one explicitly".into(),
    ))
}

/// Map a raw header onto [`ImageMetadata`] using `telescope`'s keywords.
///
/// # Errors
///
/// `PipelineError::Validation` when a required field is missing or the date
/// cannot be parsed.
pub fn normalize(
    header: &FitsHeader,
    name: &str,
    telescope: &Telescope,
) -> Result<ImageMetadata, PipelineError> {
    let options = telescope.options();
    let map = &options.header;

    let filter = required(header, &map.filter)?;
    let target = required(header, &map.object)?;
    let observed_at = observed_at(header, map)?;

    let pointing = header.text(&map.ra).zip(header.text(&map.dec));

    Ok(ImageMetadata {
        telescope: name.to_string(),
        code: options.code.clone(),
        passband: Passband::parse(&filter),
        target,
        observed_at,
        mjd: modified_julian_date(observed_at),
        pointing,
        pixel_scale_low: options.pixel_scale_low,
        pixel_scale_high: options.pixel_scale_high,
        has_wcs: header.has_wcs(),
    })
}

fn required(header: &FitsHeader, keyword: &str) -> Result<String, PipelineError> {
    header
        .text(keyword)
        .ok_or_else(|| PipelineError::Validation(format!("missing header keyword '{keyword}'")))
}

fn observed_at(header: &FitsHeader, map: &HeaderMap) -> Result<NaiveDateTime, PipelineError> {
    let date = required(header, &map.date)?;
    let time = match &map.time {
        Some(key) => Some(required(header, key)?),
        None => None,
    };
    parse_observed_at(&date, time.as_deref(), map.date_format.as_deref())
}

/// Combine a date value and an optional time-of-day value.
///
/// A date that already carries an ISO time wins over the separate time
/// field. Fractional seconds are discarded.
fn parse_observed_at(
    date: &str,
    time: Option<&str>,
    format: Option<&str>,
) -> Result<NaiveDateTime, PipelineError> {
    let invalid = || PipelineError::Validation(format!("unparseable observation date '{date}'"));

    if date.contains('T') {
        return NaiveDateTime::parse_from_str(whole_seconds(date), ISO_DATETIME)
            .map_err(|_| invalid());
    }

    let day = format
        .into_iter()
        .chain([ISO_DATE])
        .find_map(|f| NaiveDate::parse_from_str(date, f).ok())
        .ok_or_else(invalid)?;

    let time_of_day = match time {
        Some(t) => NaiveTime::parse_from_str(whole_seconds(t), TIME_OF_DAY).map_err(|_| {
            PipelineError::Validation(format!("unparseable observation time '{t}'"))
        })?,
        None => NaiveTime::MIN,
    };

    Ok(day.and_time(time_of_day))
}

fn whole_seconds(value: &str) -> &str {
    value.split('.').next().unwrap_or(value).trim()
}

/// MJD rounded to five decimals (under a second).
#[allow(clippy::cast_precision_loss)]
fn modified_julian_date(at: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    let days = (at - epoch).num_seconds() as f64 / SECONDS_PER_DAY;
    (days * 1e5).round() / 1e5
}

/// Fraction of the day as `.ffff`, leading zero stripped.
fn fractional_day(time: NaiveTime) -> String {
    let fraction = f64::from(time.num_seconds_from_midnight()) / SECONDS_PER_DAY;
    format!("{fraction:.4}").trim_start_matches('0').to_string()
}
