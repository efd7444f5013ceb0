use flipp_config::FlippConfig;
use flipp_core::entities::{LightcurvePoint, Source};
use serde::Serialize;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::subcommands::CatalogCommands;
use crate::output::output;

#[derive(Debug, Serialize)]
struct LightcurveResponse {
    source: Source,
    points: Vec<LightcurvePoint>,
}

/// Handle `flipp catalog`.
pub async fn handle(
    action: &CatalogCommands,
    config: &FlippConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let store = bootstrap::open_store(config).await?;
    match action {
        CatalogCommands::Stats => output(&store.catalog_stats().await?, flags.format),
        CatalogCommands::Lightcurve { source_id } => {
            let source = store.get_source(source_id).await?;
            let points = store.lightcurve(source_id).await?;
            output(&LightcurveResponse { source, points }, flags.format)
        }
    }
}
