//! Error types for the sheetflow coordinator.
//!
//! Step execution errors never cross the coordination boundary: the runner
//! turns them into a [`StepOutcome`](crate::core::StepOutcome). They are
//! still typed so that sheet implementations and monitors can signal the
//! right condition.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::Step;

/// Errors raised while resolving or executing a step.
#[derive(Debug, Error)]
pub enum StepError {
    /// The identifier does not name any step of the catalog.
    #[error("Cannot find Step for id {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The step could not produce its result, and the user has already
    /// been informed of the details.
    #[error("Step {step} failed: {reason}")]
    StepFailure {
        /// The failing step.
        step: Step,
        /// Short reason, for the log.
        reason: String,
    },

    /// A step other than LOAD was requested while no sheet is loaded.
    #[error("No sheet available for step {step}, LOAD must run first")]
    MissingSheet {
        /// The requested step.
        step: Step,
    },

    /// LOAD was requested without a source to load the sheet from.
    #[error("Step {step} requires a source file to load the sheet")]
    MissingSource {
        /// The requested step.
        step: Step,
    },

    /// The sheet could not be built from its source.
    #[error("Cannot load sheet from {}: {reason}", path.display())]
    Load {
        /// The source path.
        path: PathBuf,
        /// Why loading failed.
        reason: String,
    },

    /// Any other failure raised while a step was running.
    #[error("Unexpected error in step {step}: {reason}")]
    Unexpected {
        /// The step being executed.
        step: Step,
        /// The underlying error message.
        reason: String,
    },

    /// The monitor refused or failed to schedule a step.
    #[error("Monitor error: {0}")]
    Monitor(String),
}

impl StepError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a step failure, for errors already shown to the user.
    #[must_use]
    pub fn step_failure(step: Step, reason: impl Into<String>) -> Self {
        Self::StepFailure {
            step,
            reason: reason.into(),
        }
    }

    /// Creates a load error.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wraps any displayable error as an unexpected failure of `step`.
    #[must_use]
    pub fn unexpected(step: Step, err: impl std::fmt::Display) -> Self {
        Self::Unexpected {
            step,
            reason: err.to_string(),
        }
    }

    /// Returns true if the user has already been told about this error.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::StepFailure { .. })
    }

    /// Returns the step this error relates to, when known.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::StepFailure { step, .. }
            | Self::MissingSheet { step }
            | Self::MissingSource { step }
            | Self::Unexpected { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns a short type name, used in failure records.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::StepFailure { .. } => "StepFailure",
            Self::MissingSheet { .. } => "MissingSheet",
            Self::MissingSource { .. } => "MissingSource",
            Self::Load { .. } => "Load",
            Self::Unexpected { .. } => "Unexpected",
            Self::Monitor(_) => "Monitor",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        if let Some(step) = self.step() {
            map.insert("step".to_string(), serde_json::json!(step.id()));
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors outside step execution: configuration and logging setup.
#[derive(Debug, Error)]
pub enum SheetflowError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup error: {0}")]
    Logging(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StepError::not_found("bogus");
        assert_eq!(err.to_string(), "Cannot find Step for id bogus");
        assert_eq!(err.step(), None);
        assert!(!err.is_reported());
    }

    #[test]
    fn test_step_failure_is_reported() {
        let err = StepError::step_failure(Step::Bars, "no staff found");
        assert!(err.is_reported());
        assert_eq!(err.step(), Some(Step::Bars));
        assert!(err.to_string().contains("BARS"));
    }

    #[test]
    fn test_unexpected_wraps_message() {
        let err = StepError::unexpected(Step::Skew, anyhow::anyhow!("index out of range"));
        assert!(!err.is_reported());
        assert_eq!(err.kind(), "Unexpected");
        assert!(err.to_string().contains("SKEW"));
        assert!(err.to_string().contains("index out of range"));
    }

    #[test]
    fn test_load_error_names_path() {
        let err = StepError::load("/tmp/missing.png", "file not found");
        assert!(err.to_string().contains("/tmp/missing.png"));
    }

    #[test]
    fn test_error_to_dict() {
        let err = StepError::MissingSheet { step: Step::Lines };
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "MissingSheet");
        assert_eq!(dict.get("step").unwrap(), "LINES");
    }
}
