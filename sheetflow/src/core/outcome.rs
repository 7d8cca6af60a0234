//! Outcome of a step request as seen by the pipeline driver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Step, StepReport};
use crate::errors::StepError;

/// What happened to a step request.
///
/// Failures are contained by the runner and show up here instead of as a
/// propagated error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step ran to completion.
    Completed(StepReport),
    /// The step was handed to the monitor, which runs it on its own terms.
    Delegated {
        /// The delegated step.
        step: Step,
    },
    /// The step failed and the user has already been informed.
    Reported {
        /// The failed step.
        step: Step,
        /// Failure reason.
        reason: String,
    },
    /// The step failed unexpectedly; a warning was logged.
    Failed {
        /// The failed step.
        step: Step,
        /// Error type name.
        kind: String,
        /// Failure reason.
        reason: String,
    },
}

impl StepOutcome {
    /// Builds the contained outcome for an error raised by `step`.
    #[must_use]
    pub fn from_error(step: Step, err: &StepError) -> Self {
        match err {
            StepError::StepFailure { reason, .. } => Self::Reported {
                step,
                reason: reason.clone(),
            },
            other => Self::Failed {
                step,
                kind: other.kind().to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Returns the step this outcome is about.
    #[must_use]
    pub fn step(&self) -> Step {
        match self {
            Self::Completed(report) => report.step,
            Self::Delegated { step } | Self::Reported { step, .. } | Self::Failed { step, .. } => {
                *step
            }
        }
    }

    /// Returns true if the step completed in place.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if the step failed, reported or not.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Reported { .. } | Self::Failed { .. })
    }

    /// Returns the report of a completed step.
    #[must_use]
    pub fn report(&self) -> Option<&StepReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("step".to_string(), serde_json::json!(self.step().id()));
        match self {
            Self::Completed(report) => {
                map.insert("outcome".to_string(), serde_json::json!("completed"));
                map.insert("duration_ms".to_string(), serde_json::json!(report.duration_ms));
            }
            Self::Delegated { .. } => {
                map.insert("outcome".to_string(), serde_json::json!("delegated"));
            }
            Self::Reported { reason, .. } => {
                map.insert("outcome".to_string(), serde_json::json!("reported"));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Failed { kind, reason, .. } => {
                map.insert("outcome".to_string(), serde_json::json!("failed"));
                map.insert("error_type".to_string(), serde_json::json!(kind));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
        }
        map
    }
}
