//! Photometric passbands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter an image was taken through.
///
/// Named bands parse case-insensitively. Anything else is kept verbatim as
/// `Other` so that the calibrator, not the header parser, decides whether a
/// band is supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Passband {
    Clear,
    B,
    V,
    R,
    I,
    Other(String),
}

impl Passband {
    /// Parse a header filter value. Surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "b" => Self::B,
            "v" => Self::V,
            "r" => Self::R,
            "i" => Self::I,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Return the string representation used in SQL storage and file names.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clear => "clear",
            Self::B => "B",
            Self::V => "V",
            Self::R => "R",
            Self::I => "I",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for Passband {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Passband {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Passband> for String {
    fn from(value: Passband) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Passband {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
