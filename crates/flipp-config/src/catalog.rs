//! Reference photometric catalog (APASS) client options.

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://www.aavso.org/cgi-bin/apass_download.pl".to_string()
}

fn default_user_agent() -> String {
    "UC Berkeley Filippenko Group's Photometry Pipeline".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
