//! Shared fixtures: FITS writer and in-process stand-ins for the external
//! tools and the reference catalog.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use flipp_core::detection::Detection;
use flipp_core::sky::SkyCoord;
use flipp_pipeline::{AstrometricSolver, PipelineError, SolveRequest, SourceExtractor};
use flipp_refcat::{CatalogError, ReferenceCatalog, ReferenceStar};

/// Fixed-format card: strings start in column 11, other values end in column 30.
pub fn card(keyword: &str, value: &str) -> String {
    let text = if value.starts_with('\'') {
        format!("{keyword:<8}= {value}")
    } else {
        format!("{keyword:<8}= {value:>20}")
    };
    format!("{text:<80}")
}

/// Write a header-only FITS file.
pub fn write_fits(dir: &Path, name: &str, cards: &[String]) -> PathBuf {
    let mut text = card("SIMPLE", "T");
    text.push_str(&card("BITPIX", "16"));
    text.push_str(&card("NAXIS", "0"));
    for c in cards {
        text.push_str(c);
    }
    text.push_str(&format!("{:<80}", "END"));
    while text.len() % 2880 != 0 {
        text.push(' ');
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

pub fn kait_cards(object: &str, date: &str, ut: &str, filter: &str) -> Vec<String> {
    vec![
        card("INSTRUME", "'K.A.I.T.'"),
        card("OBJECT", &format!("'{object}'")),
        card("FILTERS", &format!("'{filter}'")),
        card("DATE-OBS", &format!("'{date}'")),
        card("UT", &format!("'{ut}'")),
        card("RA", "'10:00:00.00'"),
        card("DEC", "'+20:00:00.0'"),
    ]
}

pub fn wcs_cards() -> Vec<String> {
    vec![
        card("CTYPE1", "'RA---TAN'"),
        card("CTYPE2", "'DEC--TAN'"),
        card("CRVAL1", "150.0"),
        card("CRVAL2", "20.0"),
        card("CRPIX1", "512.0"),
        card("CRPIX2", "512.0"),
    ]
}

/// Copies the input to the requested output path.
pub struct CopySolver;

impl AstrometricSolver for CopySolver {
    async fn solve(&self, request: &SolveRequest) -> Result<Option<PathBuf>, PipelineError> {
        tokio::fs::copy(&request.image, &request.new_fits).await?;
        Ok(Some(request.new_fits.clone()))
    }
}

/// Runs but never finds a solution.
pub struct NoSolution;

impl AstrometricSolver for NoSolution {
    async fn solve(&self, _request: &SolveRequest) -> Result<Option<PathBuf>, PipelineError> {
        Ok(None)
    }
}

/// Takes far longer than any configured timeout.
pub struct StuckSolver;

impl AstrometricSolver for StuckSolver {
    async fn solve(&self, _request: &SolveRequest) -> Result<Option<PathBuf>, PipelineError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }
}

pub struct FixedExtractor(pub Vec<Detection>);

impl SourceExtractor for FixedExtractor {
    async fn extract(&self, _image: &Path) -> Result<Vec<Detection>, PipelineError> {
        Ok(self.0.clone())
    }
}

pub struct PanickingExtractor;

impl SourceExtractor for PanickingExtractor {
    async fn extract(&self, _image: &Path) -> Result<Vec<Detection>, PipelineError> {
        panic!("extractor exploded")
    }
}

pub struct FixedCatalog(pub Vec<ReferenceStar>);

impl ReferenceCatalog for FixedCatalog {
    async fn query(
        &self,
        _center: SkyCoord,
        _radius_deg: f64,
    ) -> Result<Vec<ReferenceStar>, CatalogError> {
        Ok(self.0.clone())
    }
}

pub struct DownCatalog;

impl ReferenceCatalog for DownCatalog {
    async fn query(
        &self,
        _center: SkyCoord,
        _radius_deg: f64,
    ) -> Result<Vec<ReferenceStar>, CatalogError> {
        Err(CatalogError::Api {
            status: 503,
            message: "service unavailable".into(),
        })
    }
}

/// Four clean detections 36" apart plus one flagged row. Only the first sits
/// on a reference star.
pub fn field_detections() -> Vec<Detection> {
    let mut flagged = Detection::at(5, 150.05, 20.0, 11.0, 0.02);
    flagged.flags = 4;
    vec![
        Detection::at(1, 150.0, 20.0, 15.0, 0.02),
        Detection::at(2, 150.01, 20.0, 14.0, 0.02),
        Detection::at(3, 150.02, 20.0, 13.0, 0.02),
        Detection::at(4, 150.03, 20.0, 12.0, 0.02),
        flagged,
    ]
}

/// g = 15.0, r = 14.5 at the first detection: R = 14.31105.
pub fn field_stars() -> Vec<ReferenceStar> {
    vec![ReferenceStar {
        sloan_g: Some(15.0),
        sloan_r: Some(14.5),
        johnson_v: Some(14.8),
        ..ReferenceStar::at(150.0, 20.0)
    }]
}
