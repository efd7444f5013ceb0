//! Image repository: identity lookup and lookup-before-create.

use chrono::Utc;

use flipp_core::entities::Image;
use flipp_core::ids::PREFIX_IMAGE;

use crate::error::DatabaseError;
use crate::helpers::{get_count, parse_datetime};
use crate::service::CatalogService;

/// Fields of an image row that does not exist yet.
///
/// `(path, telescope, passband)` is the image's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub path: String,
    pub telescope: String,
    pub passband: String,
    pub mjd: f64,
}

fn row_to_image(row: &libsql::Row) -> Result<Image, DatabaseError> {
    Ok(Image {
        id: row.get::<String>(0)?,
        path: row.get::<String>(1)?,
        telescope: row.get::<String>(2)?,
        passband: row.get::<String>(3)?,
        mjd: row.get::<f64>(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl CatalogService {
    pub async fn find_image(
        &self,
        path: &str,
        telescope: &str,
        passband: &str,
    ) -> Result<Option<Image>, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, path, telescope, passband, mjd, created_at
                 FROM images WHERE path = ?1 AND telescope = ?2 AND passband = ?3",
                [path, telescope, passband],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_image(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_image(&self, id: &str) -> Result<Image, DatabaseError> {
        let mut rows = self
            .db()
            .query(
                "SELECT id, path, telescope, passband, mjd, created_at
                 FROM images WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("image", id))?;
        row_to_image(&row)
    }

    pub async fn create_image(&self, new: &NewImage) -> Result<Image, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_IMAGE).await?;

        self.db()
            .execute(
                "INSERT INTO images (id, path, telescope, passband, mjd, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    new.path.as_str(),
                    new.telescope.as_str(),
                    new.passband.as_str(),
                    new.mjd,
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Image {
            id,
            path: new.path.clone(),
            telescope: new.telescope.clone(),
            passband: new.passband.clone(),
            mjd: new.mjd,
            created_at: now,
        })
    }

    /// Resolve the image with `new`'s identity, creating it if absent.
    ///
    /// Returns the row and whether it was created by this call. An existing
    /// row is returned unchanged (its MJD is not updated).
    pub async fn get_or_create_image(&self, new: &NewImage) -> Result<(Image, bool), DatabaseError> {
        if let Some(existing) = self
            .find_image(&new.path, &new.telescope, &new.passband)
            .await?
        {
            return Ok((existing, false));
        }
        let image = self.create_image(new).await?;
        tracing::debug!(image_id = %image.id, path = %image.path, "image created");
        Ok((image, true))
    }

    pub async fn count_images(&self) -> Result<u64, DatabaseError> {
        let mut rows = self.db().query("SELECT COUNT(*) FROM images", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_service;

    fn new_image(passband: &str) -> NewImage {
        NewImage {
            path: "20200102/sn2020abc_20200102.4321_k_clear_cal.fit".into(),
            telescope: "kait".into(),
            passband: passband.into(),
            mjd: 58850.4321,
        }
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let svc = test_service().await;

        let (first, created) = svc.get_or_create_image(&new_image("clear")).await.unwrap();
        assert!(created);
        let (second, created) = svc.get_or_create_image(&new_image("clear")).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(svc.count_images().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn passband_is_part_of_identity() {
        let svc = test_service().await;
        let (clear, _) = svc.get_or_create_image(&new_image("clear")).await.unwrap();
        let (v, created) = svc.get_or_create_image(&new_image("V")).await.unwrap();
        assert!(created);
        assert_ne!(clear.id, v.id);
        assert_eq!(svc.count_images().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected_by_store() {
        let svc = test_service().await;
        svc.create_image(&new_image("clear")).await.unwrap();
        assert!(svc.create_image(&new_image("clear")).await.is_err());
    }

    #[tokio::test]
    async fn find_image_roundtrip() {
        let svc = test_service().await;
        assert!(
            svc.find_image("nope", "kait", "clear")
                .await
                .unwrap()
                .is_none()
        );
        let created = svc.create_image(&new_image("R")).await.unwrap();
        let found = svc
            .find_image(&created.path, "kait", "R")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert!((found.mjd - 58850.4321).abs() < 1e-9);
        assert_eq!(svc.get_image(&created.id).await.unwrap().path, created.path);
    }
}
