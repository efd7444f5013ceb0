use anyhow::Context;
use flipp_config::FlippConfig;
use flipp_db::service::CatalogService;

use crate::cli::GlobalFlags;

/// Load `.env`, then the layered configuration.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<FlippConfig> {
    let explicit = flags.config.as_deref();
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("config file '{}' does not exist", path.display());
        }
    }
    FlippConfig::load_with_dotenv(explicit).context("failed to load flipp configuration")
}

/// Open the catalog store at the configured location, creating its
/// directory on first use.
pub async fn open_store(config: &FlippConfig) -> anyhow::Result<CatalogService> {
    let path = config.database.resolved_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create catalog directory {}", parent.display())
        })?;
    }
    let path_str = path
        .to_str()
        .with_context(|| format!("catalog path is not valid UTF-8: {}", path.display()))?;
    CatalogService::new_local(path_str)
        .await
        .with_context(|| format!("failed to open catalog store at {}", path.display()))
}
