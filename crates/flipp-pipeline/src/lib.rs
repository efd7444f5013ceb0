//! # flipp-pipeline
//!
//! Per-image photometry pipeline.
//!
//! Each input image moves strictly forward through
//! `Validating → Solving → Extracting → Calibrating → Matching → Done`:
//!
//! 1. Read the primary header and normalize telescope metadata ([`metadata`])
//! 2. Plate-solve with an external astrometric solver ([`solver`])
//! 3. Extract point sources with an external extractor ([`extractor`])
//! 4. Derive and apply a photometric zeropoint ([`calibrate`])
//! 5. Cross-match detections into the catalog store ([`matcher`])
//!
//! [`Pipeline`] drives one image or a batch, turning every per-image failure
//! into an [`ImageReport`] so that one bad frame never stops the run.

pub mod calibrate;
mod context;
pub mod error;
pub mod extractor;
pub mod fits;
pub mod matcher;
pub mod metadata;
pub mod orchestrator;
pub mod solver;
pub mod stage;

pub use calibrate::{Calibration, ZeropointCalibrator};
pub use error::PipelineError;
pub use extractor::{SExtractor, SourceExtractor};
pub use fits::FitsHeader;
pub use matcher::{MatchSummary, SourceMatcher};
pub use metadata::{ImageMetadata, header_keywords};
pub use orchestrator::{
    BatchReport, ImageOutcome, ImageReport, IngestedImage, Pipeline, PipelineOptions, solve_image,
};
pub use solver::{AstrometricSolver, SolveField, SolveRequest};
pub use stage::{Stage, StageOutcome};
