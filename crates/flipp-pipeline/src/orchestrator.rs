//! Drives images through the stage machine and turns every outcome into a
//! report.
//!
//! One image never takes the batch down: classified failures are logged as
//! warnings, anything else (store, catalog service, tools, even panics) is
//! logged with its cause chain, and the batch moves on to the next input.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flipp_config::FlippConfig;
use flipp_core::detection::clean_only;
use flipp_db::repos::image::NewImage;
use flipp_db::service::CatalogService;
use flipp_refcat::ReferenceCatalog;
use futures::FutureExt;
use serde::Serialize;
use tracing::Instrument;

use crate::calibrate::ZeropointCalibrator;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::extractor::SourceExtractor;
use crate::fits::FitsHeader;
use crate::matcher::{MatchSummary, SourceMatcher};
use crate::metadata::{ImageMetadata, header_keywords, normalize, resolve_telescope};
use crate::solver::{AstrometricSolver, SolveRequest};
use crate::stage::{Stage, StageOutcome};

/// Per-run knobs layered over the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Root of the per-night output tree.
    pub output_root: PathBuf,
    /// Force a telescope instead of inferring it from each header.
    pub telescope: Option<String>,
    /// Reuse an existing WCS instead of running the solver.
    pub skip_solved: bool,
    /// Where inputs that fail astrometry are copied for manual review.
    pub review_dir: Option<PathBuf>,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &FlippConfig) -> Self {
        Self {
            output_root: config.pipeline.resolved_output_root(),
            telescope: None,
            skip_solved: false,
            review_dir: config.pipeline.review_dir.as_ref().map(PathBuf::from),
        }
    }
}

/// A successfully ingested image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestedImage {
    pub frame_id: String,
    /// Solved image written under the output root.
    pub output: PathBuf,
    pub zeropoint: f64,
    /// Cross-matches behind the zeropoint.
    pub calibration_matches: usize,
    pub summary: MatchSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Ingested(IngestedImage),
    /// Bad image; expected during a normal run.
    Skipped { stage: Stage, reason: String },
    /// Environment problem, with the full cause chain.
    Failed { stage: Stage, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageReport {
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

impl ImageReport {
    #[must_use]
    pub const fn is_ingested(&self) -> bool {
        matches!(self.outcome, ImageOutcome::Ingested(_))
    }
}

/// Reports for a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
    pub images: Vec<ImageReport>,
}

impl BatchReport {
    fn push(&mut self, report: ImageReport) {
        match report.outcome {
            ImageOutcome::Ingested(_) => self.ingested += 1,
            ImageOutcome::Skipped { .. } => self.skipped += 1,
            ImageOutcome::Failed { .. } => self.failed += 1,
        }
        self.images.push(report);
    }
}

pub struct Pipeline<'a, S, E, C> {
    config: &'a FlippConfig,
    store: &'a CatalogService,
    solver: S,
    extractor: E,
    calibrator: ZeropointCalibrator<C>,
    options: PipelineOptions,
}

impl<'a, S, E, C> Pipeline<'a, S, E, C>
where
    S: AstrometricSolver,
    E: SourceExtractor,
    C: ReferenceCatalog,
{
    pub fn new(
        config: &'a FlippConfig,
        store: &'a CatalogService,
        solver: S,
        extractor: E,
        catalog: C,
        options: PipelineOptions,
    ) -> Self {
        Self {
            config,
            store,
            solver,
            extractor,
            calibrator: ZeropointCalibrator::new(catalog, config.calibration.clone()),
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process images one after another, in input order.
    pub async fn run_batch(&self, inputs: &[PathBuf]) -> BatchReport {
        self.run_batch_with(inputs, |_| {}).await
    }

    /// Like [`Self::run_batch`], calling `on_image` after each image.
    pub async fn run_batch_with<F>(&self, inputs: &[PathBuf], mut on_image: F) -> BatchReport
    where
        F: FnMut(&ImageReport),
    {
        let mut batch = BatchReport::default();
        for input in inputs {
            let report = self.process(input).await;
            on_image(&report);
            batch.push(report);
        }
        tracing::info!(
            ingested = batch.ingested,
            skipped = batch.skipped,
            failed = batch.failed,
            "batch finished"
        );
        batch
    }

    /// Run one image through every stage. Never fails: the outcome is in the
    /// report.
    pub async fn process(&self, input: &Path) -> ImageReport {
        let span = tracing::info_span!(
            "image",
            path = %input.display(),
            frame = tracing::field::Empty
        );
        let mut stage = Stage::Validating;

        let result = AssertUnwindSafe(self.run_stages(input, &mut stage))
            .catch_unwind()
            .instrument(span.clone())
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Other(panic_error(panic.as_ref()))));

        let _entered = span.enter();
        let outcome = match StageOutcome::from(result) {
            StageOutcome::Success(ingested) => ImageOutcome::Ingested(ingested),
            StageOutcome::SkippableFailure(error) => {
                tracing::warn!(%stage, %error, "image skipped");
                ImageOutcome::Skipped {
                    stage,
                    reason: error.to_string(),
                }
            }
            StageOutcome::UnexpectedFailure(error) => {
                let chain = format!("{:#}", anyhow::Error::from(error));
                tracing::error!(%stage, error = %chain, "image failed");
                ImageOutcome::Failed {
                    stage,
                    error: chain,
                }
            }
        };

        ImageReport {
            input: input.to_path_buf(),
            outcome,
        }
    }

    async fn run_stages(
        &self,
        input: &Path,
        stage: &mut Stage,
    ) -> Result<IngestedImage, PipelineError> {
        *stage = Stage::Validating;
        let context = PipelineContext::prepare(input).await?;
        let keywords = header_keywords(self.config);
        let header = FitsHeader::read(context.working_copy(), keywords.iter().map(String::as_str))?;
        let (name, telescope) =
            resolve_telescope(&header, self.config, self.options.telescope.as_deref())?;
        let meta = normalize(&header, name, telescope)?;
        let frame_id = meta.frame_id();
        tracing::Span::current().record("frame", frame_id.as_str());
        self.validate(&context).await?;

        *stage = stage.next();
        let output_dir = self.options.output_root.join(meta.output_subdir());
        let output = output_dir.join(meta.output_file_name());
        let solved = if self.options.skip_solved && meta.has_wcs {
            tracing::info!("header already carries a WCS, solver skipped");
            context.working_copy().to_path_buf()
        } else {
            self.solve(&context, &meta, input).await?
        };
        tokio::fs::create_dir_all(&output_dir).await?;
        tokio::fs::copy(&solved, &output).await?;
        tracing::debug!(output = %output.display(), "solved image written");

        *stage = stage.next();
        let detections = clean_only(self.extractor.extract(&output).await?);

        *stage = stage.next();
        let calibration = self
            .calibrator
            .calibrate(detections, &meta.passband)
            .await?;

        *stage = stage.next();
        let image = NewImage {
            path: format!("{}/{}", meta.output_subdir(), meta.output_file_name()),
            telescope: meta.telescope.clone(),
            passband: meta.passband.to_string(),
            mjd: meta.mjd,
        };
        let summary = SourceMatcher::new(self.store, self.config.matching.tolerance_arcsec)
            .match_sources(&calibration.sources, &image)
            .await?;

        *stage = stage.next();
        tracing::info!(zeropoint = calibration.zeropoint, "image ingested");
        Ok(IngestedImage {
            frame_id,
            output,
            zeropoint: calibration.zeropoint,
            calibration_matches: calibration.matched,
            summary,
        })
    }

    /// Quick extractor pass on the raw frame to reject near-empty images.
    async fn validate(&self, context: &PipelineContext) -> Result<(), PipelineError> {
        let threshold = self.config.pipeline.validation_threshold;
        let found = self.extractor.extract(context.working_copy()).await?.len();
        if found <= threshold {
            return Err(PipelineError::Validation(format!(
                "source extractor found {found} sources, need more than {threshold}"
            )));
        }
        Ok(())
    }

    async fn solve(
        &self,
        context: &PipelineContext,
        meta: &ImageMetadata,
        input: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let work_dir = context.scratch_dir().join("solve");
        tokio::fs::create_dir_all(&work_dir).await?;
        let request = SolveRequest {
            image: context.working_copy().to_path_buf(),
            pointing: meta.pointing.clone(),
            scale_low: meta.pixel_scale_low,
            scale_high: meta.pixel_scale_high,
            new_fits: work_dir.join("solved.fits"),
            work_dir,
        };

        let limit = self.config.solver.timeout_secs;
        let failure = match tokio::time::timeout(
            Duration::from_secs(limit),
            self.solver.solve(&request),
        )
        .await
        {
            Ok(Ok(Some(solved))) => return Ok(solved),
            Ok(Ok(None)) => PipelineError::astrometry("solver found no solution"),
            Ok(Err(error)) => return Err(error),
            Err(_) => PipelineError::astrometry(format!("solver timed out after {limit}s")),
        };

        if let Some(review_dir) = &self.options.review_dir {
            copy_for_review(input, review_dir).await;
        }
        Err(failure)
    }
}

/// Best effort: a failed copy is logged, never escalated.
async fn copy_for_review(input: &Path, review_dir: &Path) {
    let Some(name) = input.file_name() else {
        return;
    };
    let target = review_dir.join(name);
    let copied = async {
        tokio::fs::create_dir_all(review_dir).await?;
        tokio::fs::copy(input, &target).await
    };
    match copied.await {
        Ok(_) => tracing::info!(target = %target.display(), "copied for review"),
        Err(error) => tracing::warn!(%error, "could not copy image for review"),
    }
}

fn panic_error(panic: &(dyn std::any::Any + Send)) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    anyhow::anyhow!("panicked: {message}")
}

/// Solve one image without the rest of the pipeline.
///
/// Writes `<stem>-SOLVED.fits` into `output_dir` and returns its path.
///
/// # Errors
///
/// `PipelineError::Validation` for an unknown telescope,
/// `PipelineError::AstrometryFailed` when the solver finds nothing or times
/// out, and I/O or tool errors as they occur.
pub async fn solve_image<S: AstrometricSolver>(
    config: &FlippConfig,
    solver: &S,
    input: &Path,
    telescope: &str,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let context = PipelineContext::prepare(input).await?;
    let keywords = header_keywords(config);
    let header = FitsHeader::read(context.working_copy(), keywords.iter().map(String::as_str))?;
    let (_, telescope) = resolve_telescope(&header, config, Some(telescope))?;
    let options = telescope.options();

    let work_dir = context.scratch_dir().join("solve");
    tokio::fs::create_dir_all(&work_dir).await?;
    let request = SolveRequest {
        image: context.working_copy().to_path_buf(),
        pointing: header
            .text(&options.header.ra)
            .zip(header.text(&options.header.dec)),
        scale_low: options.pixel_scale_low,
        scale_high: options.pixel_scale_high,
        new_fits: work_dir.join("solved.fits"),
        work_dir,
    };

    let limit = config.solver.timeout_secs;
    let solved = tokio::time::timeout(Duration::from_secs(limit), solver.solve(&request))
        .await
        .map_err(|_| PipelineError::astrometry(format!("solver timed out after {limit}s")))??
        .ok_or_else(|| PipelineError::astrometry("solver found no solution"))?;

    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy().into_owned());
    tokio::fs::create_dir_all(output_dir).await?;
    let output = output_dir.join(format!("{stem}-SOLVED.fits"));
    tokio::fs::copy(&solved, &output).await?;
    Ok(output)
}
