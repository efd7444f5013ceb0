use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod discover;
mod output;
mod progress;
mod write_lock;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("flipp error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();
    init_tracing(flags.log_level())?;

    let config = bootstrap::load_config(&flags)?;
    tracing::debug!(database = %config.database.resolved_path().display(), "configuration loaded");
    commands::dispatch::dispatch(cli.command, &config, &flags).await
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FLIPP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}
