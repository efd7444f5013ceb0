//! Rows produced by the point-source extractor and the calibrator.

use serde::{Deserialize, Serialize};

use crate::sky::SkyCoord;

/// One detected point source with its instrumental photometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub number: u32,
    pub ra: f64,
    pub dec: f64,
    /// Instrumental magnitude (`MAG_AUTO`).
    pub mag: f64,
    /// Instrumental magnitude error (`MAGERR_AUTO`).
    pub mag_err: f64,
    pub x_image: Option<f64>,
    pub y_image: Option<f64>,
    pub fwhm: Option<f64>,
    pub elongation: Option<f64>,
    /// Extractor quality flags; non-zero rows are discarded downstream.
    pub flags: u32,
}

impl Detection {
    /// Minimal detection with no shape parameters and clean flags.
    #[must_use]
    pub const fn at(number: u32, ra: f64, dec: f64, mag: f64, mag_err: f64) -> Self {
        Self {
            number,
            ra,
            dec,
            mag,
            mag_err,
            x_image: None,
            y_image: None,
            fwhm: None,
            elongation: None,
            flags: 0,
        }
    }

    #[must_use]
    pub const fn position(&self) -> SkyCoord {
        SkyCoord::new_unchecked(self.ra, self.dec)
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.flags == 0
    }
}

/// A detection with its zeropoint-corrected magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedDetection {
    pub detection: Detection,
    pub magnitude: f64,
    pub magnitude_err: f64,
}

impl CalibratedDetection {
    #[must_use]
    pub const fn position(&self) -> SkyCoord {
        self.detection.position()
    }
}

/// Drop every row carrying non-zero extractor flags.
#[must_use]
pub fn clean_only(detections: Vec<Detection>) -> Vec<Detection> {
    detections.into_iter().filter(Detection::is_clean).collect()
}
