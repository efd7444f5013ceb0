use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A processed frame. Identified by `(path, telescope, passband)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: String,
    /// Output path relative to the output root.
    pub path: String,
    pub telescope: String,
    pub passband: String,
    pub mjd: f64,
    pub created_at: DateTime<Utc>,
}
