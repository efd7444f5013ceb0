//! AAVSO Photometric All-Sky Survey (APASS) client.
//!
//! The download endpoint takes `ra`, `dec` and `radius` in decimal degrees
//! and, with `outtype=1`, answers with CSV whose header row names the
//! columns. Only the position and the five magnitude columns are read;
//! `NA` or blank cells become missing magnitudes.

use std::time::Duration;

use flipp_config::CatalogConfig;
use flipp_core::sky::SkyCoord;

use crate::error::CatalogError;
use crate::http::csv_body;
use crate::{ReferenceCatalog, ReferenceStar};

const COL_RA: &str = "radeg";
const COL_DEC: &str = "decdeg";
const COL_B: &str = "Johnson_B";
const COL_V: &str = "Johnson_V";
const COL_G: &str = "Sloan_g";
const COL_R: &str = "Sloan_r";
const COL_I: &str = "Sloan_i";

/// HTTP client for the APASS cone-search download.
pub struct ApassClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApassClient {
    /// Build a client from the `[catalog]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the underlying client fails to build.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('?').to_string(),
        })
    }

    /// Request URL for a cone.
    #[must_use]
    pub fn query_url(&self, center: SkyCoord, radius_deg: f64) -> String {
        format!(
            "{}?ra={}&dec={}&radius={}&outtype=1",
            self.base_url,
            urlencoding::encode(&center.ra.to_string()),
            urlencoding::encode(&center.dec.to_string()),
            urlencoding::encode(&radius_deg.to_string()),
        )
    }
}

impl ReferenceCatalog for ApassClient {
    async fn query(
        &self,
        center: SkyCoord,
        radius_deg: f64,
    ) -> Result<Vec<ReferenceStar>, CatalogError> {
        let url = self.query_url(center, radius_deg);
        tracing::debug!(%url, "querying APASS");
        let resp = self.http.get(&url).send().await?;
        let body = csv_body(resp).await?;
        let stars = parse_apass_csv(&body)?;
        tracing::info!(
            ra = center.ra,
            dec = center.dec,
            radius_deg,
            stars = stars.len(),
            "APASS query complete"
        );
        Ok(stars)
    }
}

/// Parse an APASS CSV download.
///
/// # Errors
///
/// Returns [`CatalogError::Parse`] when the header lacks a required column
/// or a position cell is not a number.
pub fn parse_apass_csv(body: &str) -> Result<Vec<ReferenceStar>, CatalogError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers().map_err(malformed)?.clone();
    let index_of = |name: &str| -> Result<usize, CatalogError> {
        headers
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CatalogError::Parse(format!("missing column '{name}'")))
    };

    let ra_idx = index_of(COL_RA)?;
    let dec_idx = index_of(COL_DEC)?;
    let b_idx = index_of(COL_B)?;
    let v_idx = index_of(COL_V)?;
    let g_idx = index_of(COL_G)?;
    let r_idx = index_of(COL_R)?;
    let i_idx = index_of(COL_I)?;

    let mut stars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let line = record.position().map_or(0, csv::Position::line);
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let position = |idx: usize, name: &str| -> Result<f64, CatalogError> {
            cell(idx).parse::<f64>().map_err(|e| {
                CatalogError::Parse(format!("line {line}: bad {name} '{}': {e}", cell(idx)))
            })
        };

        stars.push(ReferenceStar {
            ra: position(ra_idx, COL_RA)?,
            dec: position(dec_idx, COL_DEC)?,
            johnson_b: magnitude(cell(b_idx)),
            johnson_v: magnitude(cell(v_idx)),
            sloan_g: magnitude(cell(g_idx)),
            sloan_r: magnitude(cell(r_idx)),
            sloan_i: magnitude(cell(i_idx)),
        });
    }
    Ok(stars)
}

fn malformed(error: csv::Error) -> CatalogError {
    CatalogError::Parse(format!("malformed CSV: {error}"))
}

fn magnitude(cell: &str) -> Option<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("na") {
        return None;
    }
    cell.parse::<f64>().ok().filter(|m| m.is_finite())
}
