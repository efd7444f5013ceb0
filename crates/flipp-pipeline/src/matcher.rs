//! Cross-match calibrated detections into the catalog store.
//!
//! Each detection is attached to the nearest existing source within the
//! tolerance, or becomes a new source. Observations are keyed by
//! `(source, image)`, so re-ingesting an image adds nothing.

use flipp_core::detection::CalibratedDetection;
use flipp_core::entities::Source;
use flipp_core::sky::{SkyBox, SkyCoord, arcsec_to_deg};
use flipp_db::repos::image::NewImage;
use flipp_db::service::CatalogService;
use serde::Serialize;

use crate::error::PipelineError;

/// Counts accumulated over one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// New catalog sources.
    pub created: usize,
    /// Detections attached to an existing source.
    pub matched: usize,
    pub observations_inserted: usize,
    /// `(source, image)` pairs that already had an observation.
    pub observations_skipped: usize,
    /// Rows with a non-finite position or magnitude.
    pub skipped_invalid: usize,
    pub image_id: Option<String>,
    pub image_created: bool,
}

pub struct SourceMatcher<'a> {
    store: &'a CatalogService,
    tolerance_arcsec: f64,
}

impl<'a> SourceMatcher<'a> {
    #[must_use]
    pub const fn new(store: &'a CatalogService, tolerance_arcsec: f64) -> Self {
        Self {
            store,
            tolerance_arcsec,
        }
    }

    /// Record `sources` as observations of `image`.
    ///
    /// The image row is resolved on the first usable detection and reused for
    /// the rest of the run.
    ///
    /// # Errors
    ///
    /// `PipelineError::Database` on any store failure. Rows written before
    /// the failure stay written.
    pub async fn match_sources(
        &self,
        sources: &[CalibratedDetection],
        image: &NewImage,
    ) -> Result<MatchSummary, PipelineError> {
        let mut summary = MatchSummary::default();

        for row in sources {
            let position = row.position();
            if !(position.ra.is_finite()
                && position.dec.is_finite()
                && row.magnitude.is_finite()
                && row.magnitude_err.is_finite())
            {
                tracing::warn!(number = row.detection.number, "skipping non-finite detection");
                summary.skipped_invalid += 1;
                continue;
            }

            let source = match self.nearest_source(position).await? {
                Some(existing) => {
                    summary.matched += 1;
                    existing
                }
                None => {
                    summary.created += 1;
                    self.store.create_source(position, "", "").await?
                }
            };

            let image_id = match &summary.image_id {
                Some(id) => id.clone(),
                None => {
                    let (image_row, created) = self.store.get_or_create_image(image).await?;
                    summary.image_id = Some(image_row.id.clone());
                    summary.image_created = created;
                    image_row.id
                }
            };

            if self.store.observation_exists(&source.id, &image_id).await? {
                summary.observations_skipped += 1;
                continue;
            }
            self.store
                .create_observation(&source.id, &image_id, row.magnitude, row.magnitude_err)
                .await?;
            summary.observations_inserted += 1;
        }

        tracing::info!(
            created = summary.created,
            matched = summary.matched,
            inserted = summary.observations_inserted,
            skipped = summary.observations_skipped,
            "sources matched"
        );
        Ok(summary)
    }

    /// Nearest catalog source within tolerance. Candidates come from the
    /// bounding box in planar-proxy order, so ties keep the earlier one.
    async fn nearest_source(&self, position: SkyCoord) -> Result<Option<Source>, PipelineError> {
        let tolerance_deg = arcsec_to_deg(self.tolerance_arcsec);
        let bbox = SkyBox::around(position, tolerance_deg);
        let candidates = self.store.sources_in_box(&bbox, position).await?;

        let mut best: Option<(f64, Source)> = None;
        for candidate in candidates {
            let separation = position.separation_deg(&candidate.position());
            if best.as_ref().is_none_or(|(d, _)| separation < *d) {
                best = Some((separation, candidate));
            }
        }
        Ok(best
            .filter(|(separation, _)| *separation <= tolerance_deg)
            .map(|(_, source)| source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipp_core::detection::Detection;
    use pretty_assertions::assert_eq;

    async fn store() -> CatalogService {
        CatalogService::new_local(":memory:").await.unwrap()
    }

    fn calibrated(ra: f64, dec: f64, magnitude: f64) -> CalibratedDetection {
        CalibratedDetection {
            detection: Detection::at(1, ra, dec, magnitude - 20.0, 0.01),
            magnitude,
            magnitude_err: 0.01,
        }
    }

    fn image() -> NewImage {
        NewImage {
            path: "20150609/sn2014c_20150609.2500_k_V_cal.fit".into(),
            telescope: "kait".into(),
            passband: "V".into(),
            mjd: 57182.25,
        }
    }

    #[tokio::test]
    async fn nearest_source_wins_by_true_separation() {
        let store = store().await;
        let far = store
            .create_source(SkyCoord::new_unchecked(180.0 + arcsec_to_deg(11.0), 0.0), "", "")
            .await
            .unwrap();
        let near = store
            .create_source(SkyCoord::new_unchecked(180.0 + arcsec_to_deg(9.0), 0.0), "", "")
            .await
            .unwrap();

        let matcher = SourceMatcher::new(&store, 10.0);
        let found = matcher
            .nearest_source(SkyCoord::new_unchecked(180.0, 0.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, near.id);
        assert_ne!(found.id, far.id);
    }

    #[rstest::rstest]
    #[case::inside(9.0, true)]
    #[case::outside(11.0, false)]
    #[tokio::test]
    async fn tolerance_boundary_uses_true_separation(#[case] offset_arcsec: f64, #[case] hit: bool) {
        let store = store().await;
        store
            .create_source(SkyCoord::new_unchecked(180.0, 0.0), "", "")
            .await
            .unwrap();

        let matcher = SourceMatcher::new(&store, 10.0);
        let summary = matcher
            .match_sources(&[calibrated(180.0 + arcsec_to_deg(offset_arcsec), 0.0, 15.0)], &image())
            .await
            .unwrap();

        assert_eq!(summary.matched == 1, hit);
        assert_eq!(summary.created == 1, !hit);
        let expected_sources = if hit { 1 } else { 2 };
        assert_eq!(store.catalog_stats().await.unwrap().sources, expected_sources);
    }

    #[tokio::test]
    async fn unmatched_detection_creates_a_source() {
        let store = store().await;
        let matcher = SourceMatcher::new(&store, 10.0);
        let summary = matcher
            .match_sources(&[calibrated(10.0, 10.0, 15.0)], &image())
            .await
            .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.observations_inserted, 1);
        assert!(summary.image_created);

        let stats = store.catalog_stats().await.unwrap();
        assert_eq!((stats.sources, stats.images, stats.observations), (1, 1, 1));
    }

    #[tokio::test]
    async fn non_finite_rows_are_skipped() {
        let store = store().await;
        let matcher = SourceMatcher::new(&store, 10.0);
        let summary = matcher
            .match_sources(
                &[calibrated(f64::NAN, 10.0, 15.0), calibrated(10.0, 10.0, f64::INFINITY)],
                &image(),
            )
            .await
            .unwrap();

        assert_eq!(summary.skipped_invalid, 2);
        assert_eq!(summary.image_id, None);
        assert_eq!(store.catalog_stats().await.unwrap().sources, 0);
    }

    #[tokio::test]
    async fn two_detections_on_one_source_insert_once() {
        let store = store().await;
        let matcher = SourceMatcher::new(&store, 10.0);
        let summary = matcher
            .match_sources(
                &[
                    calibrated(10.0, 10.0, 15.0),
                    calibrated(10.0 + arcsec_to_deg(1.0), 10.0, 15.1),
                ],
                &image(),
            )
            .await
            .unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.observations_inserted, 1);
        assert_eq!(summary.observations_skipped, 1);
    }
}
