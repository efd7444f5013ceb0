//! Point-source extraction.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use flipp_config::ExtractorConfig;
use flipp_core::detection::Detection;
use tokio::process::Command;

use crate::error::PipelineError;

const CATALOG_FILE: &str = "catalog.cat";

/// Finds point sources in a (solved) image.
pub trait SourceExtractor {
    /// Every detection in `image`, in the extractor's table order.
    fn extract(&self, image: &Path) -> impl Future<Output = Result<Vec<Detection>, PipelineError>>;
}

impl<T: SourceExtractor> SourceExtractor for &T {
    fn extract(&self, image: &Path) -> impl Future<Output = Result<Vec<Detection>, PipelineError>> {
        (**self).extract(image)
    }
}

/// `SExtractor`, run as a subprocess writing an `ASCII_HEAD` catalog.
#[derive(Debug, Clone)]
pub struct SExtractor {
    command: String,
    config_file: Option<PathBuf>,
    param_file: Option<PathBuf>,
    filter_file: Option<PathBuf>,
}

impl SExtractor {
    #[must_use]
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            command: config.command.clone(),
            config_file: config.config_file(),
            param_file: config.param_file(),
            filter_file: config.filter_file(),
        }
    }

    fn args(&self, image: &Path, catalog: &Path) -> Vec<String> {
        let mut args = vec![
            image.display().to_string(),
            "-CATALOG_NAME".to_string(),
            catalog.display().to_string(),
            "-CATALOG_TYPE".to_string(),
            "ASCII_HEAD".to_string(),
            "-CHECKIMAGE_TYPE".to_string(),
            "NONE".to_string(),
        ];
        for (flag, file) in [
            ("-c", &self.config_file),
            ("-PARAMETERS_NAME", &self.param_file),
            ("-FILTER_NAME", &self.filter_file),
        ] {
            if let Some(file) = file {
                args.extend([flag.to_string(), file.display().to_string()]);
            }
        }
        args
    }
}

impl SourceExtractor for SExtractor {
    async fn extract(&self, image: &Path) -> Result<Vec<Detection>, PipelineError> {
        let scratch = tempfile::tempdir()?;
        let catalog = scratch.path().join(CATALOG_FILE);

        let output = Command::new(&self.command)
            .args(self.args(image, &catalog))
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PipelineError::Tool(format!("failed to run {}: {e}", self.command)))?;

        if !output.status.success() {
            return Err(PipelineError::Tool(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = tokio::fs::read_to_string(&catalog).await.map_err(|e| {
            PipelineError::Tool(format!("{} wrote no catalog: {e}", self.command))
        })?;
        let detections = parse_ascii_head(&text)?;
        tracing::debug!(count = detections.len(), image = %image.display(), "sources extracted");
        Ok(detections)
    }
}

/// Parse an `ASCII_HEAD` catalog.
///
/// Columns are located through the `#   n NAME` header lines, so the
/// parameter file may list them in any order or add others.
///
/// # Errors
///
/// `PipelineError::Tool` when a required column is missing or a row's
/// position, magnitude, `NUMBER` or `FLAGS` does not parse. Unparseable
/// shape columns are logged and left empty.
pub fn parse_ascii_head(text: &str) -> Result<Vec<Detection>, PipelineError> {
    let mut columns: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let mut parts = header.split_whitespace();
            let index = parts.next().and_then(|i| i.parse::<usize>().ok());
            if let (Some(index @ 1..), Some(name)) = (index, parts.next()) {
                columns.insert(name.to_ascii_uppercase(), index - 1);
            }
            continue;
        }
        rows.push(line);
    }

    let column = |name: &str| {
        columns
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::Tool(format!("extractor catalog lacks column {name}")))
    };
    let ra = column("ALPHA_J2000")?;
    let dec = column("DELTA_J2000")?;
    let mag = column("MAG_AUTO")?;
    let mag_err = column("MAGERR_AUTO")?;
    let flags = column("FLAGS")?;
    let number = columns.get("NUMBER").copied();
    let x_image = columns.get("X_IMAGE").copied();
    let y_image = columns.get("Y_IMAGE").copied();
    let fwhm = columns.get("FWHM_IMAGE").copied();
    let elongation = columns.get("ELONGATION").copied();

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let line = i + 1;
            let fields: Vec<&str> = row.split_whitespace().collect();
            let float = |idx: usize| cell::<f64>(&fields, idx, line, row);
            let optional = |idx: Option<usize>, name: &str| {
                let idx = idx?;
                float(idx)
                    .inspect_err(|_| {
                        tracing::warn!(row = line, column = name, "unparseable extractor value ignored");
                    })
                    .ok()
            };

            let number = match number {
                Some(idx) => cell::<u32>(&fields, idx, line, row)?,
                None => u32::try_from(line).unwrap_or(u32::MAX),
            };
            Ok(Detection {
                number,
                ra: float(ra)?,
                dec: float(dec)?,
                mag: float(mag)?,
                mag_err: float(mag_err)?,
                x_image: optional(x_image, "X_IMAGE"),
                y_image: optional(y_image, "Y_IMAGE"),
                fwhm: optional(fwhm, "FWHM_IMAGE"),
                elongation: optional(elongation, "ELONGATION"),
                flags: cell(&fields, flags, line, row)?,
            })
        })
        .collect()
}

fn cell<T: FromStr>(fields: &[&str], idx: usize, line: usize, row: &str) -> Result<T, PipelineError> {
    fields
        .get(idx)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| PipelineError::Tool(format!("bad extractor row {line}: {row}")))
}
