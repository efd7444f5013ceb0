//! Entity structs for the flipp catalog.
//!
//! Each entity maps to a table in the libSQL catalog store. All structs derive
//! `Serialize` and `Deserialize` for JSON output from the CLI.

mod image;
mod observation;
mod source;

pub use image::Image;
pub use observation::{LightcurvePoint, Observation};
pub use source::Source;
