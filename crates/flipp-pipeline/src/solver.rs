//! Astrometric plate solving.
//!
//! The pipeline only needs "give me a WCS-tagged copy of this image or tell
//! me you could not". [`SolveField`] gets that from astrometry.net's
//! `solve-field`; tests substitute their own [`AstrometricSolver`].

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use flipp_config::SolverConfig;
use tokio::process::Command;

use crate::error::PipelineError;

/// Inputs for one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
    pub image: PathBuf,
    /// Pointing hint `(ra, dec)` in any form the solver accepts.
    pub pointing: Option<(String, String)>,
    pub scale_low: f64,
    pub scale_high: f64,
    /// Scratch directory for the solver's by-products.
    pub work_dir: PathBuf,
    /// Where the solved image should be written.
    pub new_fits: PathBuf,
}

/// Produces a copy of an image carrying a WCS solution.
pub trait AstrometricSolver {
    /// Solve `request.image`. `Ok(None)` means the solver ran but found no
    /// solution.
    fn solve(
        &self,
        request: &SolveRequest,
    ) -> impl Future<Output = Result<Option<PathBuf>, PipelineError>>;
}

impl<T: AstrometricSolver> AstrometricSolver for &T {
    fn solve(
        &self,
        request: &SolveRequest,
    ) -> impl Future<Output = Result<Option<PathBuf>, PipelineError>> {
        (**self).solve(request)
    }
}

/// astrometry.net `solve-field`.
#[derive(Debug, Clone)]
pub struct SolveField {
    command: String,
    search_radius_deg: f64,
    tweak_order: u32,
    backend_config: Option<String>,
    extractor_path: Option<String>,
}

impl SolveField {
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            command: config.command.clone(),
            search_radius_deg: config.search_radius_deg,
            tweak_order: config.tweak_order,
            backend_config: config.backend_config.clone(),
            extractor_path: config.extractor_path.clone(),
        }
    }

    /// Full argument list for one request.
    #[must_use]
    pub fn args(&self, request: &SolveRequest) -> Vec<String> {
        let mut args = vec![
            "--overwrite".to_string(),
            "--no-plots".to_string(),
            "--scale-units".to_string(),
            "arcsecperpix".to_string(),
            "--scale-low".to_string(),
            request.scale_low.to_string(),
            "--scale-high".to_string(),
            request.scale_high.to_string(),
            "--tweak-order".to_string(),
            self.tweak_order.to_string(),
        ];
        if let Some((ra, dec)) = &request.pointing {
            args.extend([
                "--ra".to_string(),
                ra.clone(),
                "--dec".to_string(),
                dec.clone(),
                "--radius".to_string(),
                self.search_radius_deg.to_string(),
            ]);
        }
        if let Some(backend) = &self.backend_config {
            args.extend(["--backend-config".to_string(), backend.clone()]);
        }
        if let Some(extractor) = &self.extractor_path {
            args.extend(["--source-extractor-path".to_string(), extractor.clone()]);
        }
        args.extend([
            "--dir".to_string(),
            path_arg(&request.work_dir),
            "--new-fits".to_string(),
            path_arg(&request.new_fits),
            path_arg(&request.image),
        ]);
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

impl AstrometricSolver for SolveField {
    async fn solve(&self, request: &SolveRequest) -> Result<Option<PathBuf>, PipelineError> {
        let args = self.args(request);
        tracing::debug!(command = %self.command, ?args, "running solver");

        let output = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PipelineError::Tool(format!("failed to run {}: {e}", self.command)))?;

        // solve-field exits 0 even when no field is found; the output file
        // is the only reliable signal.
        if request.new_fits.exists() {
            return Ok(Some(request.new_fits.clone()));
        }
        tracing::debug!(
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "solver produced no output"
        );
        Ok(None)
    }
}
