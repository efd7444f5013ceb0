use std::io::IsTerminal;
use std::path::PathBuf;

use clap::ValueEnum;

/// How command results are printed on stdout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON.
    Json,
    /// One JSON document per line, for piping.
    Raw,
}

/// Flags shared by every subcommand.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub no_progress: bool,
}

impl GlobalFlags {
    /// Default `tracing` directive when `FLIPP_LOG` is unset.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Progress is drawn on stderr, and only for an interactive terminal.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress && std::io::stderr().is_terminal()
    }
}
