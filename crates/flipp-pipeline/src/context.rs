//! Scoped scratch space for one image.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::PipelineError;

/// A private working copy of the input inside a temp dir. Everything in the
/// directory is removed when the context is dropped, on every exit path.
pub(crate) struct PipelineContext {
    scratch: TempDir,
    working_copy: PathBuf,
}

impl PipelineContext {
    pub(crate) async fn prepare(input: &Path) -> Result<Self, PipelineError> {
        let scratch = tempfile::Builder::new().prefix("flipp-").tempdir()?;
        let name = input
            .file_name()
            .map_or_else(|| "input.fits".into(), |n| n.to_os_string());
        let working_copy = scratch.path().join(name);
        tokio::fs::copy(input, &working_copy).await?;
        Ok(Self {
            scratch,
            working_copy,
        })
    }

    pub(crate) fn working_copy(&self) -> &Path {
        &self.working_copy
    }

    pub(crate) fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn working_copy_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frame.fit");
        std::fs::write(&input, b"data").unwrap();

        let context = PipelineContext::prepare(&input).await.unwrap();
        let copy = context.working_copy().to_path_buf();
        let scratch = context.scratch_dir().to_path_buf();
        assert_eq!(std::fs::read(&copy).unwrap(), b"data");

        drop(context);
        assert!(!scratch.exists());
        assert!(input.exists());
    }

    #[tokio::test]
    async fn missing_input_is_an_io_error() {
        let err = PipelineContext::prepare(Path::new("/nonexistent/frame.fit"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
