//! # flipp-refcat
//!
//! Reference photometric catalog access for zeropoint calibration.
//!
//! - [`ReferenceCatalog`]: the cone-search seam the calibrator depends on
//! - [`ApassClient`]: AAVSO Photometric All-Sky Survey over HTTP (CSV output)
//! - [`CachedCatalog`]: process-lifetime memoization keyed by query cone

mod apass;
mod cache;
mod error;
mod http;

pub use apass::{ApassClient, parse_apass_csv};
pub use cache::CachedCatalog;
pub use error::CatalogError;

use std::future::Future;

use flipp_core::sky::SkyCoord;
use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────

/// Standard passbands a reference star may carry a magnitude in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    JohnsonB,
    JohnsonV,
    SloanG,
    SloanR,
    SloanI,
}

/// One catalog star. Missing magnitudes are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStar {
    pub ra: f64,
    pub dec: f64,
    pub johnson_b: Option<f64>,
    pub johnson_v: Option<f64>,
    pub sloan_g: Option<f64>,
    pub sloan_r: Option<f64>,
    pub sloan_i: Option<f64>,
}

impl ReferenceStar {
    /// Star at a position with no magnitudes.
    #[must_use]
    pub const fn at(ra: f64, dec: f64) -> Self {
        Self {
            ra,
            dec,
            johnson_b: None,
            johnson_v: None,
            sloan_g: None,
            sloan_r: None,
            sloan_i: None,
        }
    }

    #[must_use]
    pub const fn position(&self) -> SkyCoord {
        SkyCoord::new_unchecked(self.ra, self.dec)
    }

    #[must_use]
    pub const fn magnitude(&self, band: Band) -> Option<f64> {
        match band {
            Band::JohnsonB => self.johnson_b,
            Band::JohnsonV => self.johnson_v,
            Band::SloanG => self.sloan_g,
            Band::SloanR => self.sloan_r,
            Band::SloanI => self.sloan_i,
        }
    }
}

// ── Seam ───────────────────────────────────────────────────────────

/// A cone search over a reference photometric catalog.
pub trait ReferenceCatalog {
    /// Every star within `radius_deg` of `center`.
    fn query(
        &self,
        center: SkyCoord,
        radius_deg: f64,
    ) -> impl Future<Output = Result<Vec<ReferenceStar>, CatalogError>>;
}

impl<T: ReferenceCatalog> ReferenceCatalog for &T {
    fn query(
        &self,
        center: SkyCoord,
        radius_deg: f64,
    ) -> impl Future<Output = Result<Vec<ReferenceStar>, CatalogError>> {
        (**self).query(center, radius_deg)
    }
}
