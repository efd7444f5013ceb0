use std::path::PathBuf;

use flipp_config::FlippConfig;
use flipp_pipeline::{SolveField, solve_image};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SolveArgs;
use crate::output::output;
use crate::progress::Spinner;

#[derive(Debug, Serialize)]
struct SolveResponse {
    input: PathBuf,
    output: PathBuf,
}

/// Handle `flipp solve`.
pub async fn handle(
    args: &SolveArgs,
    config: &FlippConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let solver = SolveField::from_config(&config.solver);
    let spinner = Spinner::start(
        format!("solving {}", args.input.display()),
        flags.show_progress(),
    );

    match solve_image(config, &solver, &args.input, &args.telescope, &args.output_dir).await {
        Ok(written) => {
            spinner.succeed();
            output(
                &SolveResponse {
                    input: args.input.clone(),
                    output: written,
                },
                flags.format,
            )
        }
        Err(error) => {
            spinner.fail("solve failed");
            Err(anyhow::Error::from(error)
                .context(format!("could not solve {}", args.input.display())))
        }
    }
}
