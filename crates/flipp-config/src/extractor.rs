//! Point-source extractor (`SExtractor`) options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_command() -> String {
    "sex".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Executable name or path (`sex` or `source-extractor`).
    #[serde(default = "default_command")]
    pub command: String,

    /// Directory holding `default.sex`, `default.param` and
    /// `gauss_3.0_5x5.conv`. Unset means the extractor's built-in defaults.
    #[serde(default)]
    pub config_dir: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            config_dir: None,
        }
    }
}

impl ExtractorConfig {
    /// `default.sex` inside the config dir, if one is set.
    #[must_use]
    pub fn config_file(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| PathBuf::from(dir).join("default.sex"))
    }

    #[must_use]
    pub fn param_file(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| PathBuf::from(dir).join("default.param"))
    }

    #[must_use]
    pub fn filter_file(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| PathBuf::from(dir).join("gauss_3.0_5x5.conv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_files_follow_config_dir() {
        let config = ExtractorConfig {
            config_dir: Some("/etc/flipp/sextractor".into()),
            ..Default::default()
        };
        assert_eq!(
            config.param_file(),
            Some(PathBuf::from("/etc/flipp/sextractor/default.param"))
        );
        assert!(ExtractorConfig::default().config_file().is_none());
    }
}
