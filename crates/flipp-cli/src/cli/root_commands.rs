use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::CatalogCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run images through the full pipeline into the catalog.
    Process(ProcessArgs),
    /// Plate-solve one image without calibrating it.
    Solve(SolveArgs),
    /// Inspect the catalog store.
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ProcessArgs {
    /// Image files or directories of images.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Root of the per-night output tree (defaults to `pipeline.output_root`).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Telescope name; inferred from each header when omitted.
    #[arg(short, long)]
    pub telescope: Option<String>,

    /// File extensions to pick up from directories (defaults to
    /// `pipeline.extensions`).
    #[arg(short, long, value_delimiter = ',')]
    pub ext: Vec<String>,

    /// Descend into subdirectories.
    #[arg(short, long)]
    pub recursive: bool,

    /// Reuse an existing WCS solution instead of re-solving.
    #[arg(long)]
    pub skip_solved: bool,

    /// Copy images that fail astrometry here.
    #[arg(long)]
    pub review_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SolveArgs {
    pub input: PathBuf,

    pub telescope: String,

    /// Directory for the `<name>-SOLVED.fits` output.
    #[arg(short, long)]
    pub output_dir: PathBuf,
}
