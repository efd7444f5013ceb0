//! # flipp-core
//!
//! Core types, sky geometry, and error types for flipp.
//!
//! This crate provides the foundational types shared across all flipp crates:
//! - Entity structs for the catalog (sources, images, observations)
//! - The `Passband` enum and ID prefix constants
//! - Great-circle geometry and the matcher's bounding-box pre-filter
//! - Detection rows produced by the point-source extractor
//! - Cross-cutting error types

pub mod detection;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod sky;
