//! stderr progress for long-running commands.
//!
//! Both helpers are inert when progress is disabled, so handlers call them
//! unconditionally.

use std::time::Duration;

use flipp_pipeline::{ImageOutcome, ImageReport};
use indicatif::{ProgressBar, ProgressStyle};

const BATCH_TEMPLATE: &str = "{bar:32.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}";

/// One tick per image, with running outcome counts in the message.
pub struct BatchProgress {
    bar: Option<ProgressBar>,
    ingested: usize,
    skipped: usize,
    failed: usize,
}

impl BatchProgress {
    #[must_use]
    pub fn new(images: usize, enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new(u64::try_from(images).unwrap_or(u64::MAX));
            bar.set_style(
                ProgressStyle::with_template(BATCH_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        });
        Self {
            bar,
            ingested: 0,
            skipped: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, report: &ImageReport) {
        match report.outcome {
            ImageOutcome::Ingested(_) => self.ingested += 1,
            ImageOutcome::Skipped { .. } => self.skipped += 1,
            ImageOutcome::Failed { .. } => self.failed += 1,
        }
        if let Some(bar) = &self.bar {
            bar.set_message(self.message(report));
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    fn message(&self, last: &ImageReport) -> String {
        let name = last
            .input
            .file_name()
            .map_or_else(|| last.input.display().to_string(), |n| n.to_string_lossy().into_owned());
        format!(
            "{} ok, {} skipped, {} failed | {name}",
            self.ingested, self.skipped, self.failed
        )
    }
}

/// Indeterminate spinner for single operations such as `flipp solve`.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    #[must_use]
    pub fn start(message: String, enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_message(message);
            bar
        });
        Self { bar }
    }

    pub fn succeed(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn fail(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use flipp_pipeline::{ImageOutcome, ImageReport, Stage};
    use pretty_assertions::assert_eq;

    use super::BatchProgress;

    fn skipped(name: &str) -> ImageReport {
        ImageReport {
            input: PathBuf::from("/night").join(name),
            outcome: ImageOutcome::Skipped {
                stage: Stage::Validating,
                reason: "missing FILTERS".into(),
            },
        }
    }

    #[test]
    fn tallies_outcomes_without_a_terminal() {
        let mut progress = BatchProgress::new(2, false);
        progress.record(&skipped("a.fit"));
        progress.record(&ImageReport {
            input: PathBuf::from("/night/b.fit"),
            outcome: ImageOutcome::Failed {
                stage: Stage::Calibrating,
                error: "catalog returned 503".into(),
            },
        });
        progress.finish();

        assert_eq!((progress.ingested, progress.skipped, progress.failed), (0, 1, 1));
        assert_eq!(
            progress.message(&skipped("c.fit")),
            "0 ok, 1 skipped, 1 failed | c.fit"
        );
    }
}
