//! Repository methods on `CatalogService`, one module per record kind.

pub mod image;
pub mod observation;
pub mod source;
