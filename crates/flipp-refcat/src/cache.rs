//! Process-lifetime memoization of catalog queries.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use flipp_core::sky::SkyCoord;

use crate::{CatalogError, ReferenceCatalog, ReferenceStar};

type ConeKey = (u64, u64, u64);

/// Wraps a catalog and remembers every successful answer by its exact
/// `(ra, dec, radius)` cone. Failures are not cached.
pub struct CachedCatalog<C> {
    inner: C,
    entries: Mutex<HashMap<ConeKey, Vec<ReferenceStar>>>,
}

impl<C> CachedCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Number of cones currently remembered.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cone_key(center: SkyCoord, radius_deg: f64) -> ConeKey {
    (
        center.ra.to_bits(),
        center.dec.to_bits(),
        radius_deg.to_bits(),
    )
}

impl<C: ReferenceCatalog> ReferenceCatalog for CachedCatalog<C> {
    async fn query(
        &self,
        center: SkyCoord,
        radius_deg: f64,
    ) -> Result<Vec<ReferenceStar>, CatalogError> {
        let key = cone_key(center, radius_deg);
        let cached = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(stars) = cached {
            tracing::debug!(ra = center.ra, dec = center.dec, radius_deg, "catalog cache hit");
            return Ok(stars);
        }

        let stars = self.inner.query(center, radius_deg).await?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, stars.clone());
        Ok(stars)
    }
}
