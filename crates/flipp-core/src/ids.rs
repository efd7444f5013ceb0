//! ID prefix constants.
//!
//! Catalog IDs are generated by the store as `{prefix}-{16 hex chars}`.

pub const PREFIX_SOURCE: &str = "src";
pub const PREFIX_IMAGE: &str = "img";
pub const PREFIX_OBSERVATION: &str = "obs";

/// Every prefix in use, for exhaustive ID tests.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_SOURCE, PREFIX_IMAGE, PREFIX_OBSERVATION];
