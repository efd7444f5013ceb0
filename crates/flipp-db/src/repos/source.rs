//! Source repository: creation, lookup, and the bounding-box candidate query.

use chrono::Utc;

use flipp_core::entities::Source;
use flipp_core::ids::PREFIX_SOURCE;
use flipp_core::sky::{SkyBox, SkyCoord};

use crate::error::DatabaseError;
use crate::helpers::{get_count, get_string_or_empty, parse_datetime};
use crate::service::CatalogService;

fn row_to_source(row: &libsql::Row) -> Result<Source, DatabaseError> {
    Ok(Source {
        id: row.get::<String>(0)?,
        ra: row.get::<f64>(1)?,
        dec: row.get::<f64>(2)?,
        name: get_string_or_empty(row, 3)?,
        classification: get_string_or_empty(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl CatalogService {
    /// Insert a new catalog source at `position`.
    pub async fn create_source(
        &self,
        position: SkyCoord,
        name: &str,
        classification: &str,
    ) -> Result<Source, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SOURCE).await?;

        self.db()
            .execute(
                "INSERT INTO sources (id, ra, dec, name, classification, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    position.ra,
                    position.dec,
                    name,
                    classification,
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Source {
            id,
            ra: position.ra,
            dec: position.dec,
            name: name.to_string(),
            classification: classification.to_string(),
            created_at: now,
        })
    }

    pub async fn get_source(&self, id: &str) -> Result<Source, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, ra, dec, name, classification, created_at
                 FROM sources WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("source", id))?;
        row_to_source(&row)
    }

    /// Sources inside `bbox`, nearest to `center` first by the planar proxy
    /// `(ra - ra0)^2 + (dec - dec0)^2`, then by id.
    pub async fn sources_in_box(
        &self,
        bbox: &SkyBox,
        center: SkyCoord,
    ) -> Result<Vec<Source>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, ra, dec, name, classification, created_at
                 FROM sources
                 WHERE dec BETWEEN ?1 AND ?2 AND ra BETWEEN ?3 AND ?4
                 ORDER BY ((ra - ?5) * (ra - ?5) + (dec - ?6) * (dec - ?6)) ASC, id ASC",
                libsql::params![
                    bbox.dec_min,
                    bbox.dec_max,
                    bbox.ra_min,
                    bbox.ra_max,
                    center.ra,
                    center.dec
                ],
            )
            .await?;

        let mut sources = Vec::new();
        while let Some(row) = rows.next().await? {
            sources.push(row_to_source(&row)?);
        }
        Ok(sources)
    }

    pub async fn count_sources(&self) -> Result<u64, DatabaseError> {
        let mut rows = self.db().query("SELECT COUNT(*) FROM sources", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }
}

#[cfg(test)]
mod tests {
    use flipp_core::sky::arcsec_to_deg;

    use super::*;
    use crate::test_support::test_service;

    #[tokio::test]
    async fn create_source_roundtrip() {
        let svc = test_service().await;
        let created = svc
            .create_source(SkyCoord::new_unchecked(180.0, -12.5), "", "")
            .await
            .unwrap();

        assert!(created.id.starts_with("src-"));
        let fetched = svc.get_source(&created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert!((fetched.ra - 180.0).abs() < 1e-12);
        assert!((fetched.dec + 12.5).abs() < 1e-12);
        assert!(fetched.name.is_empty());
        assert!(fetched.classification.is_empty());
    }

    #[tokio::test]
    async fn get_missing_source_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_source("src-missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "source 'src-missing' not found");
    }

    #[tokio::test]
    async fn box_query_filters_and_orders_by_proxy() {
        let svc = test_service().await;
        let center = SkyCoord::new_unchecked(150.0, 2.0);
        let far = svc
            .create_source(SkyCoord::new_unchecked(150.0 + arcsec_to_deg(8.0), 2.0), "", "")
            .await
            .unwrap();
        let near = svc
            .create_source(SkyCoord::new_unchecked(150.0, 2.0 + arcsec_to_deg(3.0)), "", "")
            .await
            .unwrap();
        svc.create_source(SkyCoord::new_unchecked(151.0, 2.0), "", "")
            .await
            .unwrap();

        let bbox = SkyBox::around(center, arcsec_to_deg(10.0));
        let found = svc.sources_in_box(&bbox, center).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![near.id.as_str(), far.id.as_str()]);
    }

    #[tokio::test]
    async fn count_sources_tracks_inserts() {
        let svc = test_service().await;
        assert_eq!(svc.count_sources().await.unwrap(), 0);
        svc.create_source(SkyCoord::new_unchecked(1.0, 1.0), "sn2020abc", "SN Ia")
            .await
            .unwrap();
        assert_eq!(svc.count_sources().await.unwrap(), 1);
    }
}
