use anyhow::Context;
use flipp_config::FlippConfig;
use flipp_pipeline::{Pipeline, PipelineOptions, SExtractor, SolveField};
use flipp_refcat::{ApassClient, CachedCatalog};

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::ProcessArgs;
use crate::discover::discover;
use crate::output::output;
use crate::progress::BatchProgress;
use crate::write_lock::{self, CatalogWriteLock};

/// Handle `flipp process`.
pub async fn handle(
    args: &ProcessArgs,
    config: &FlippConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    if let Some(name) = &args.telescope {
        if config.telescope(name).is_none() {
            let known: Vec<&str> = config.telescopes.keys().map(String::as_str).collect();
            anyhow::bail!(
                "unknown telescope '{name}' (configured: {})",
                known.join(", ")
            );
        }
    }

    let extensions = if args.ext.is_empty() {
        config.pipeline.extensions.clone()
    } else {
        args.ext.clone()
    };
    let inputs = discover(&args.inputs, &extensions, args.recursive);
    if inputs.is_empty() {
        tracing::warn!("no input images found");
    }

    let _lock =
        CatalogWriteLock::acquire(&config.database.resolved_path(), write_lock::DEFAULT_WAIT).await?;
    let store = bootstrap::open_store(config).await?;
    let catalog = CachedCatalog::new(
        ApassClient::from_config(&config.catalog).context("failed to build catalog client")?,
    );

    let options = options_for(args, config);
    tracing::info!(
        images = inputs.len(),
        output_root = %options.output_root.display(),
        "starting batch"
    );
    let pipeline = Pipeline::new(
        config,
        &store,
        SolveField::from_config(&config.solver),
        SExtractor::from_config(&config.extractor),
        catalog,
        options,
    );

    let mut progress = BatchProgress::new(inputs.len(), flags.show_progress());
    let report = pipeline
        .run_batch_with(&inputs, |image| progress.record(image))
        .await;
    progress.finish();

    output(&report, flags.format)
}

fn options_for(args: &ProcessArgs, config: &FlippConfig) -> PipelineOptions {
    let mut options = PipelineOptions::from_config(config);
    if let Some(dir) = &args.output_dir {
        options.output_root.clone_from(dir);
    }
    if let Some(dir) = &args.review_dir {
        options.review_dir = Some(dir.clone());
    }
    options.telescope.clone_from(&args.telescope);
    options.skip_solved = args.skip_solved;
    options
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use flipp_config::FlippConfig;
    use pretty_assertions::assert_eq;

    use super::options_for;
    use crate::cli::{Cli, Commands};

    fn process_args(argv: &[&str]) -> crate::cli::root_commands::ProcessArgs {
        let cli = Cli::try_parse_from(argv).expect("cli should parse");
        match cli.command {
            Commands::Process(args) => args,
            other => panic!("expected process, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_configured_defaults() {
        let mut config = FlippConfig::default();
        config.pipeline.output_root = "/data/flippout".into();
        config.pipeline.review_dir = Some("/data/review".into());

        let defaults = options_for(&process_args(&["flipp", "process", "a.fit"]), &config);
        assert_eq!(defaults.output_root, PathBuf::from("/data/flippout"));
        assert_eq!(defaults.review_dir, Some(PathBuf::from("/data/review")));
        assert_eq!(defaults.telescope, None);
        assert!(!defaults.skip_solved);

        let args = process_args(&[
            "flipp",
            "process",
            "a.fit",
            "-o",
            "/tmp/out",
            "-t",
            "nickel",
            "--review-dir",
            "/tmp/review",
            "--skip-solved",
        ]);
        let options = options_for(&args, &config);
        assert_eq!(options.output_root, PathBuf::from("/tmp/out"));
        assert_eq!(options.review_dir, Some(PathBuf::from("/tmp/review")));
        assert_eq!(options.telescope.as_deref(), Some("nickel"));
        assert!(options.skip_solved);
    }
}
