//! Sky geometry: positions, great-circle separation, and the matcher's
//! bounding-box pre-filter.
//!
//! All angles are in degrees unless a name says otherwise. Right ascension is
//! not wrapped at the 0/360 seam and the box math degrades near the poles;
//! both are known approximations.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Arcseconds per degree.
pub const ARCSEC_PER_DEG: f64 = 3600.0;

/// Below this `cos(dec)` the RA half-width is clamped to the full circle.
const MIN_COS_DEC: f64 = 1e-6;

#[must_use]
pub fn arcsec_to_deg(arcsec: f64) -> f64 {
    arcsec / ARCSEC_PER_DEG
}

#[must_use]
pub fn deg_to_arcsec(deg: f64) -> f64 {
    deg * ARCSEC_PER_DEG
}

/// An equatorial position (J2000), degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub ra: f64,
    pub dec: f64,
}

impl SkyCoord {
    /// Build a position, rejecting non-finite values and |dec| > 90.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for out-of-range input.
    pub fn new(ra: f64, dec: f64) -> Result<Self, CoreError> {
        if !ra.is_finite() || !dec.is_finite() {
            return Err(CoreError::Validation(format!(
                "non-finite sky position ({ra}, {dec})"
            )));
        }
        if dec.abs() > 90.0 {
            return Err(CoreError::Validation(format!(
                "declination {dec} outside [-90, 90]"
            )));
        }
        Ok(Self { ra, dec })
    }

    /// Build a position from values already known to be valid (store rows).
    #[must_use]
    pub const fn new_unchecked(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// True great-circle distance to `other`, in degrees.
    #[must_use]
    pub fn separation_deg(&self, other: &Self) -> f64 {
        angular_separation_deg(*self, *other)
    }

    /// True great-circle distance to `other`, in arcseconds.
    #[must_use]
    pub fn separation_arcsec(&self, other: &Self) -> f64 {
        deg_to_arcsec(self.separation_deg(other))
    }

    /// Squared flat-plane distance in (RA, Dec). Only good for ordering
    /// candidates that are already close together.
    #[must_use]
    pub fn planar_proxy(&self, other: &Self) -> f64 {
        let dra = self.ra - other.ra;
        let ddec = self.dec - other.dec;
        dra.mul_add(dra, ddec * ddec)
    }
}

/// Great-circle distance between two positions, in degrees.
///
/// Vincenty's formula, which stays accurate at both tiny and antipodal
/// separations.
#[must_use]
pub fn angular_separation_deg(a: SkyCoord, b: SkyCoord) -> f64 {
    let (lon1, lat1) = (a.ra.to_radians(), a.dec.to_radians());
    let (lon2, lat2) = (b.ra.to_radians(), b.dec.to_radians());
    let dlon = lon2 - lon1;

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_dlon, cos_dlon) = dlon.sin_cos();

    let num1 = cos_lat2 * sin_dlon;
    let num2 = cos_lat1.mul_add(sin_lat2, -(sin_lat1 * cos_lat2 * cos_dlon));
    let denominator = sin_lat1.mul_add(sin_lat2, cos_lat1 * cos_lat2 * cos_dlon);

    num1.hypot(num2).atan2(denominator).to_degrees()
}

/// Arithmetic mean of RA and Dec. `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_position(positions: &[SkyCoord]) -> Option<SkyCoord> {
    if positions.is_empty() {
        return None;
    }
    let n = positions.len() as f64;
    let (ra_sum, dec_sum) = positions
        .iter()
        .fold((0.0, 0.0), |(ra, dec), p| (ra + p.ra, dec + p.dec));
    Some(SkyCoord::new_unchecked(ra_sum / n, dec_sum / n))
}

/// Axis-aligned (RA, Dec) box used to pre-filter catalog candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyBox {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

impl SkyBox {
    /// Box around `center` whose Dec half-height is `half_size_deg` and whose
    /// RA half-width is `half_size_deg / cos(dec)`, clamped to 180.
    #[must_use]
    pub fn around(center: SkyCoord, half_size_deg: f64) -> Self {
        let cos_dec = center.dec.to_radians().cos().abs();
        let half_ra = if cos_dec < MIN_COS_DEC {
            180.0
        } else {
            (half_size_deg / cos_dec).min(180.0)
        };
        Self {
            ra_min: center.ra - half_ra,
            ra_max: center.ra + half_ra,
            dec_min: center.dec - half_size_deg,
            dec_max: center.dec + half_size_deg,
        }
    }

    #[must_use]
    pub fn contains(&self, point: SkyCoord) -> bool {
        (self.ra_min..=self.ra_max).contains(&point.ra)
            && (self.dec_min..=self.dec_max).contains(&point.dec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn separation_along_equator_is_ra_difference() {
        let a = SkyCoord::new_unchecked(180.0, 0.0);
        let b = SkyCoord::new_unchecked(180.0 + arcsec_to_deg(11.0), 0.0);
        assert!(close(a.separation_arcsec(&b), 11.0, 1e-6));
    }

    #[test]
    fn separation_shrinks_with_declination() {
        let a = SkyCoord::new_unchecked(10.0, 60.0);
        let b = SkyCoord::new_unchecked(10.0 + arcsec_to_deg(20.0), 60.0);
        // cos(60) = 0.5
        assert!(close(a.separation_arcsec(&b), 10.0, 1e-3));
    }

    #[test]
    fn separation_of_antipodes_is_180() {
        let a = SkyCoord::new_unchecked(0.0, 0.0);
        let b = SkyCoord::new_unchecked(180.0, 0.0);
        assert!(close(a.separation_deg(&b), 180.0, 1e-9));
    }

    #[test]
    fn new_rejects_bad_declination() {
        assert!(SkyCoord::new(10.0, 91.0).is_err());
        assert!(SkyCoord::new(f64::NAN, 0.0).is_err());
        assert!(SkyCoord::new(10.0, -45.0).is_ok());
    }

    #[test]
    fn mean_position_of_empty_is_none() {
        assert!(mean_position(&[]).is_none());
        let mean = mean_position(&[
            SkyCoord::new_unchecked(10.0, 1.0),
            SkyCoord::new_unchecked(12.0, 3.0),
        ])
        .unwrap();
        assert!(close(mean.ra, 11.0, 1e-12));
        assert!(close(mean.dec, 2.0, 1e-12));
    }

    #[test]
    fn box_widens_in_ra_away_from_equator() {
        let tol = arcsec_to_deg(10.0);
        let equator = SkyBox::around(SkyCoord::new_unchecked(100.0, 0.0), tol);
        let high = SkyBox::around(SkyCoord::new_unchecked(100.0, 60.0), tol);
        assert!(close(equator.ra_max - equator.ra_min, 2.0 * tol, 1e-12));
        assert!(close(high.ra_max - high.ra_min, 4.0 * tol, 1e-9));
        assert!(close(high.dec_max - high.dec_min, 2.0 * tol, 1e-12));
    }

    #[test]
    fn box_clamps_at_the_pole() {
        let bx = SkyBox::around(SkyCoord::new_unchecked(0.0, 90.0), 0.01);
        assert!(close(bx.ra_max - bx.ra_min, 360.0, 1e-9));
        assert!(bx.contains(SkyCoord::new_unchecked(120.0, 89.995)));
    }
}
