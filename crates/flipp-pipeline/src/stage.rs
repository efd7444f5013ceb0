//! Per-image processing states and stage results.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Where an image is in the pipeline. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Solving,
    Extracting,
    Calibrating,
    Matching,
    Done,
}

impl Stage {
    /// The following state; `Done` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Validating => Self::Solving,
            Self::Solving => Self::Extracting,
            Self::Extracting => Self::Calibrating,
            Self::Calibrating => Self::Matching,
            Self::Matching | Self::Done => Self::Done,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Solving => "solving",
            Self::Extracting => "extracting",
            Self::Calibrating => "calibrating",
            Self::Matching => "matching",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one stage, already classified for dispatch.
#[derive(Debug)]
pub enum StageOutcome<T> {
    Success(T),
    /// Bad image: log a warning and move on to the next input.
    SkippableFailure(PipelineError),
    /// Environment problem: log with the full cause chain and move on.
    UnexpectedFailure(PipelineError),
}

impl<T> From<Result<T, PipelineError>> for StageOutcome<T> {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) if error.is_skippable() => Self::SkippableFailure(error),
            Err(error) => Self::UnexpectedFailure(error),
        }
    }
}
