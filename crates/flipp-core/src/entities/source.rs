use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sky::SkyCoord;

/// A persisted celestial object that observations link to over time.
///
/// `ra`/`dec` are fixed at creation. Later matches link to the source, they
/// never move it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub name: String,
    pub classification: String,
    pub created_at: DateTime<Utc>,
}

impl Source {
    #[must_use]
    pub const fn position(&self) -> SkyCoord {
        SkyCoord::new_unchecked(self.ra, self.dec)
    }
}
