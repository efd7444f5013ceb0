//! Batch pipeline options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Frames with this many detections or fewer are not worth solving.
const fn default_validation_threshold() -> usize {
    3
}

fn default_extensions() -> Vec<String> {
    vec!["fits".into(), "fit".into(), "fts".into()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_validation_threshold")]
    pub validation_threshold: usize,

    /// Where frames that fail astrometry are copied for manual review.
    #[serde(default)]
    pub review_dir: Option<String>,

    /// Output root. Empty means `~/FLIPPOUT`.
    #[serde(default)]
    pub output_root: String,

    /// File extensions picked up by directory discovery (no leading dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation_threshold: default_validation_threshold(),
            review_dir: None,
            output_root: String::new(),
            extensions: default_extensions(),
        }
    }
}

impl PipelineConfig {
    /// Resolved output root: the configured one, else `~/FLIPPOUT`.
    #[must_use]
    pub fn resolved_output_root(&self) -> PathBuf {
        if !self.output_root.is_empty() {
            return PathBuf::from(&self.output_root);
        }
        dirs::home_dir().map_or_else(|| PathBuf::from("FLIPPOUT"), |home| home.join("FLIPPOUT"))
    }
}
