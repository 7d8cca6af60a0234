//! Step parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A parameter passed along with a step request.
///
/// Only LOAD makes real use of it, to know which file to load the
/// sheet from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepParam {
    /// The file a sheet is loaded from.
    Source(PathBuf),
    /// Free-form text, only shown in notifications.
    Text(String),
}

impl StepParam {
    /// Creates a source parameter.
    #[must_use]
    pub fn source(path: impl Into<PathBuf>) -> Self {
        Self::Source(path.into())
    }

    /// Creates a text parameter.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the source path, if this parameter is one.
    #[must_use]
    pub fn as_source(&self) -> Option<&Path> {
        match self {
            Self::Source(path) => Some(path),
            Self::Text(_) => None,
        }
    }
}

impl From<PathBuf> for StepParam {
    fn from(path: PathBuf) -> Self {
        Self::Source(path)
    }
}

impl From<&Path> for StepParam {
    fn from(path: &Path) -> Self {
        Self::Source(path.to_path_buf())
    }
}

impl fmt::Display for StepParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(path) => write!(f, "{}", path.display()),
            Self::Text(text) => f.write_str(text),
        }
    }
}
