//! Photometric zeropoint calibration against a reference catalog.

mod crossmatch;
mod transform;

pub use crossmatch::nearest_within;
pub use transform::PassbandTransform;

use flipp_config::CalibrationConfig;
use flipp_core::detection::{CalibratedDetection, Detection};
use flipp_core::enums::Passband;
use flipp_core::sky::{SkyCoord, arcsec_to_deg, mean_position};
use flipp_refcat::ReferenceCatalog;
use serde::Serialize;

use crate::error::PipelineError;

/// Calibrated sources plus the statistics behind the zeropoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    /// Every input detection, zeropoint applied.
    pub sources: Vec<CalibratedDetection>,
    pub zeropoint: f64,
    /// Number of finite cross-matched pairs the median was taken over.
    pub matched: usize,
    pub transform_sigma: f64,
}

/// Derives one additive zeropoint per image and applies it to every
/// detection.
pub struct ZeropointCalibrator<C> {
    catalog: C,
    config: CalibrationConfig,
}

impl<C: ReferenceCatalog> ZeropointCalibrator<C> {
    pub const fn new(catalog: C, config: CalibrationConfig) -> Self {
        Self { catalog, config }
    }

    /// Calibrate `detections` taken through `passband`.
    ///
    /// # Errors
    ///
    /// `PipelineError::ImageFailed` for an unsupported passband, an empty or
    /// oversized field, or too few cross-matches; `PipelineError::Catalog`
    /// when the catalog query fails.
    pub async fn calibrate(
        &self,
        detections: Vec<Detection>,
        passband: &Passband,
    ) -> Result<Calibration, PipelineError> {
        let transform = PassbandTransform::for_passband(passband)?;
        let (center, radius) = self.field(&detections)?;

        let stars = self.catalog.query(center, radius).await?;
        tracing::debug!(stars = stars.len(), radius, "reference stars fetched");

        let tolerance = arcsec_to_deg(self.config.crossmatch_tolerance_arcsec);
        let offsets: Vec<f64> = nearest_within(&detections, &stars, tolerance)
            .into_iter()
            .filter_map(|(d, s)| {
                let reference = transform.reference_magnitude(&stars[s])?;
                Some(reference - detections[d].mag)
            })
            .filter(|offset| offset.is_finite())
            .collect();

        let matched = offsets.len();
        let zeropoint = median(offsets).filter(|zp| zp.is_finite()).ok_or_else(|| {
            PipelineError::ImageFailed("no stars crossmatched to catalog".into())
        })?;
        if matched < self.config.min_matches {
            return Err(PipelineError::ImageFailed(format!(
                "not enough stars crossmatched to catalog ({matched} stars found)"
            )));
        }

        let sigma = transform.sigma();
        let sources = detections
            .into_iter()
            .map(|detection| {
                let magnitude_err = if self.config.include_transform_error {
                    detection.mag_err.hypot(sigma)
                } else {
                    detection.mag_err
                };
                CalibratedDetection {
                    magnitude: detection.mag + zeropoint,
                    magnitude_err,
                    detection,
                }
            })
            .collect();

        tracing::info!(zeropoint, matched, %passband, "zeropoint derived");
        Ok(Calibration {
            sources,
            zeropoint,
            matched,
            transform_sigma: sigma,
        })
    }

    /// Field center and query radius covering every detection.
    fn field(&self, detections: &[Detection]) -> Result<(SkyCoord, f64), PipelineError> {
        let positions: Vec<SkyCoord> = detections.iter().map(Detection::position).collect();
        let center = mean_position(&positions)
            .ok_or_else(|| PipelineError::ImageFailed("no detections to calibrate".into()))?;

        let extent = positions
            .iter()
            .map(|p| center.separation_deg(p))
            .fold(0.0_f64, f64::max);
        let radius = extent + self.config.field_margin_deg;
        if !radius.is_finite() || radius > self.config.max_field_radius_deg {
            return Err(PipelineError::ImageFailed(format!(
                "field size {radius:.3} deg exceeds {} deg",
                self.config.max_field_radius_deg
            )));
        }
        Ok((center, radius))
    }
}

/// Median of `values`; the mean of the middle pair for even lengths.
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipp_refcat::{CatalogError, ReferenceStar};
    use pretty_assertions::assert_eq;

    struct FixedCatalog(Vec<ReferenceStar>);

    impl ReferenceCatalog for FixedCatalog {
        async fn query(
            &self,
            _center: SkyCoord,
            _radius_deg: f64,
        ) -> Result<Vec<ReferenceStar>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    fn v_star(ra: f64, dec: f64, v: f64) -> ReferenceStar {
        ReferenceStar {
            johnson_v: Some(v),
            ..ReferenceStar::at(ra, dec)
        }
    }

    fn config(min_matches: usize) -> CalibrationConfig {
        CalibrationConfig {
            min_matches,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn median_handles_odd_and_even() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[tokio::test]
    async fn zeropoint_is_median_offset_applied_to_all() {
        let detections = vec![
            Detection::at(1, 10.0, 10.0, -5.0, 0.02),
            Detection::at(2, 10.01, 10.0, -6.0, 0.02),
            Detection::at(3, 10.0, 10.01, -7.0, 0.02),
            Detection::at(4, 10.005, 10.005, -8.0, 0.05),
        ];
        // Offsets 20.0, 20.1, 19.9; detection 4 has no star.
        let stars = vec![
            v_star(10.0, 10.0, 15.0),
            v_star(10.01, 10.0, 14.1),
            v_star(10.0, 10.01, 12.9),
        ];
        let calibrator = ZeropointCalibrator::new(FixedCatalog(stars), config(3));
        let result = calibrator.calibrate(detections, &Passband::V).await.unwrap();

        assert_eq!(result.matched, 3);
        assert!((result.zeropoint - 20.0).abs() < 1e-9);
        assert_eq!(result.sources.len(), 4);
        assert!((result.sources[3].magnitude - 12.0).abs() < 1e-9);
        assert_eq!(result.sources[3].magnitude_err, 0.05);
        assert_eq!(result.transform_sigma, 0.0);
    }

    #[tokio::test]
    async fn zero_crossmatches_fail_the_image() {
        let detections = vec![Detection::at(1, 10.0, 10.0, -5.0, 0.02)];
        let calibrator =
            ZeropointCalibrator::new(FixedCatalog(vec![v_star(11.0, 11.0, 15.0)]), config(3));
        let err = calibrator.calibrate(detections, &Passband::V).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageFailed(msg) if msg == "no stars crossmatched to catalog"));
    }

    #[tokio::test]
    async fn too_few_crossmatches_fail_with_count() {
        let detections = vec![
            Detection::at(1, 10.0, 10.0, -5.0, 0.02),
            Detection::at(2, 10.01, 10.0, -6.0, 0.02),
        ];
        let stars = vec![v_star(10.0, 10.0, 15.0), v_star(10.01, 10.0, 14.0)];
        let calibrator = ZeropointCalibrator::new(FixedCatalog(stars), config(3));
        let err = calibrator.calibrate(detections, &Passband::V).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageFailed(msg) if msg.contains("(2 stars found)")));
    }

    #[tokio::test]
    async fn oversized_field_is_rejected_before_querying() {
        let detections = vec![
            Detection::at(1, 10.0, 10.0, -5.0, 0.02),
            Detection::at(2, 13.0, 10.0, -6.0, 0.02),
        ];
        let calibrator = ZeropointCalibrator::new(FixedCatalog(vec![]), config(1));
        let err = calibrator.calibrate(detections, &Passband::V).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageFailed(msg) if msg.contains("field size")));
    }

    #[tokio::test]
    async fn empty_detections_fail_the_image() {
        let calibrator = ZeropointCalibrator::new(FixedCatalog(vec![]), config(1));
        let err = calibrator.calibrate(vec![], &Passband::V).await.unwrap_err();
        assert!(err.is_skippable());
    }

    #[tokio::test]
    async fn transform_error_added_in_quadrature_when_enabled() {
        let star = ReferenceStar {
            sloan_g: Some(15.0),
            sloan_r: Some(14.5),
            ..ReferenceStar::at(10.0, 10.0)
        };
        let config = CalibrationConfig {
            min_matches: 1,
            include_transform_error: true,
            ..CalibrationConfig::default()
        };
        let calibrator = ZeropointCalibrator::new(FixedCatalog(vec![star]), config);
        let result = calibrator
            .calibrate(vec![Detection::at(1, 10.0, 10.0, 15.0, 0.03)], &Passband::Clear)
            .await
            .unwrap();
        let expected = 0.03_f64.hypot(0.0106);
        assert!((result.sources[0].magnitude_err - expected).abs() < 1e-12);
        assert!((result.sources[0].magnitude - 14.311_05).abs() < 1e-9);
    }
}
