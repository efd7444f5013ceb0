use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One calibrated brightness measurement of a source on an image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub id: String,
    pub source_id: String,
    pub image_id: String,
    pub magnitude: f64,
    pub magnitude_err: f64,
    pub created_at: DateTime<Utc>,
}

/// An observation joined with the image it was measured on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightcurvePoint {
    pub observation_id: String,
    pub image_id: String,
    pub mjd: f64,
    pub passband: String,
    pub telescope: String,
    pub magnitude: f64,
    pub magnitude_err: f64,
}
