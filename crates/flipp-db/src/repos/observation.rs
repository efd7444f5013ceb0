//! Observation repository: idempotent inserts and per-source light curves.

use chrono::Utc;

use flipp_core::entities::{LightcurvePoint, Observation};
use flipp_core::ids::PREFIX_OBSERVATION;

use crate::error::DatabaseError;
use crate::helpers::{get_count, parse_datetime};
use crate::service::CatalogService;

fn row_to_observation(row: &libsql::Row) -> Result<Observation, DatabaseError> {
    Ok(Observation {
        id: row.get::<String>(0)?,
        source_id: row.get::<String>(1)?,
        image_id: row.get::<String>(2)?,
        magnitude: row.get::<f64>(3)?,
        magnitude_err: row.get::<f64>(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

fn row_to_lightcurve_point(row: &libsql::Row) -> Result<LightcurvePoint, DatabaseError> {
    Ok(LightcurvePoint {
        observation_id: row.get::<String>(0)?,
        image_id: row.get::<String>(1)?,
        mjd: row.get::<f64>(2)?,
        passband: row.get::<String>(3)?,
        telescope: row.get::<String>(4)?,
        magnitude: row.get::<f64>(5)?,
        magnitude_err: row.get::<f64>(6)?,
    })
}

impl CatalogService {
    pub async fn observation_exists(
        &self,
        source_id: &str,
        image_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT 1 FROM observations WHERE source_id = ?1 AND image_id = ?2 LIMIT 1",
                [source_id, image_id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    pub async fn create_observation(
        &self,
        source_id: &str,
        image_id: &str,
        magnitude: f64,
        magnitude_err: f64,
    ) -> Result<Observation, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_OBSERVATION).await?;

        self.db()
            .execute(
                "INSERT INTO observations (id, source_id, image_id, magnitude, magnitude_err, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    source_id,
                    image_id,
                    magnitude,
                    magnitude_err,
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Observation {
            id,
            source_id: source_id.to_string(),
            image_id: image_id.to_string(),
            magnitude,
            magnitude_err,
            created_at: now,
        })
    }

    pub async fn observations_for_image(
        &self,
        image_id: &str,
    ) -> Result<Vec<Observation>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, source_id, image_id, magnitude, magnitude_err, created_at
                 FROM observations WHERE image_id = ?1 ORDER BY created_at, id",
                [image_id],
            )
            .await?;
        let mut observations = Vec::new();
        while let Some(row) = rows.next().await? {
            observations.push(row_to_observation(&row)?);
        }
        Ok(observations)
    }

    /// All observations of a source joined with their images, oldest first.
    pub async fn lightcurve(&self, source_id: &str) -> Result<Vec<LightcurvePoint>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT o.id, o.image_id, i.mjd, i.passband, i.telescope, o.magnitude, o.magnitude_err
                 FROM observations o
                 JOIN images i ON i.id = o.image_id
                 WHERE o.source_id = ?1
                 ORDER BY i.mjd ASC, o.id ASC",
                [source_id],
            )
            .await?;
        let mut points = Vec::new();
        while let Some(row) = rows.next().await? {
            points.push(row_to_lightcurve_point(&row)?);
        }
        Ok(points)
    }

    pub async fn count_observations(&self) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .query("SELECT COUNT(*) FROM observations", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }
}
