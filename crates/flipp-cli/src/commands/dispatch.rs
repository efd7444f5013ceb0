use flipp_config::FlippConfig;

use crate::cli::{Commands, GlobalFlags};
use crate::commands;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: &FlippConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Process(args) => commands::process::handle(&args, config, flags).await,
        Commands::Solve(args) => commands::solve::handle(&args, config, flags).await,
        Commands::Catalog { action } => commands::catalog::handle(&action, config, flags).await,
    }
}
