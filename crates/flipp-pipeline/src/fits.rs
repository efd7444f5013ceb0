//! Primary-header access through cfitsio.
//!
//! Only the keywords the pipeline consumes are read, via `fitsio`'s keyed
//! lookup on the primary HDU. Pixel data is never touched; the external
//! tools read the image themselves.

use std::path::Path;

use fitsio::FitsFile;
use fitsio::errors::Error as FitsioError;
use fitsio::hdu::FitsHdu;

use crate::error::PipelineError;

/// Keywords that together mark an image as already carrying a WCS solution.
pub const WCS_KEYWORDS: [&str; 6] = ["CTYPE1", "CTYPE2", "CRVAL1", "CRVAL2", "CRPIX1", "CRPIX2"];

/// cfitsio `KEY_NO_EXIST`.
const KEY_NO_EXIST: i32 = 202;

/// Requested keywords found in the primary header, upper-cased, as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitsHeader {
    cards: Vec<(String, String)>,
}

impl FitsHeader {
    /// Read `keywords` (plus the WCS keywords) from the primary HDU of the
    /// file at `path`. Keywords absent from the header are left out.
    ///
    /// # Errors
    ///
    /// `PipelineError::Io` when the file cannot be reached, and
    /// `PipelineError::Validation` when cfitsio cannot open it as FITS or a
    /// keyword cannot be read.
    pub fn read<'k>(
        path: &Path,
        keywords: impl IntoIterator<Item = &'k str>,
    ) -> Result<Self, PipelineError> {
        std::fs::metadata(path)?;
        let mut fptr = FitsFile::open(path).map_err(|e| unreadable(path, e))?;
        let hdu = fptr.primary_hdu().map_err(|e| unreadable(path, e))?;

        let mut header = Self::default();
        for keyword in keywords.into_iter().chain(WCS_KEYWORDS) {
            let keyword = keyword.trim().to_ascii_uppercase();
            if keyword.is_empty() || header.get(&keyword).is_some() {
                continue;
            }
            if let Some(value) = read_text(&hdu, &mut fptr, &keyword)? {
                header.cards.push((keyword, value));
            }
        }
        tracing::debug!(path = %path.display(), keywords = header.len(), "header read");
        Ok(header)
    }

    /// Build a header from `(keyword, value)` pairs without touching a file.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            cards: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_ascii_uppercase(), v.into()))
                .collect(),
        }
    }

    /// Look up a keyword's raw value, ignoring case.
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v.as_str())
    }

    /// A keyword's value as trimmed text; blank values count as missing.
    #[must_use]
    pub fn text(&self, keyword: &str) -> Option<String> {
        let trimmed = self.get(keyword)?.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    #[must_use]
    pub fn has_wcs(&self) -> bool {
        WCS_KEYWORDS.iter().all(|k| self.get(k).is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

fn read_text(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    keyword: &str,
) -> Result<Option<String>, PipelineError> {
    match hdu.read_key::<String>(fptr, keyword) {
        Ok(value) => Ok(Some(value)),
        Err(FitsioError::Fits(e)) if e.status == KEY_NO_EXIST => Ok(None),
        Err(FitsioError::Io(e)) => Err(PipelineError::Io(e)),
        Err(e) => Err(PipelineError::Validation(format!(
            "cannot read header keyword '{keyword}': {e}"
        ))),
    }
}

fn unreadable(path: &Path, error: FitsioError) -> PipelineError {
    match error {
        FitsioError::Io(e) => PipelineError::Io(e),
        other => PipelineError::Validation(format!(
            "not a readable FITS file '{}': {other}",
            path.display()
        )),
    }
}
