//! Step result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::Step;

/// Result recorded on a sheet for one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// The step.
    pub step: Step,
    /// When the computation started.
    pub started_at: DateTime<Utc>,
    /// When the computation ended.
    pub ended_at: DateTime<Utc>,
    /// Result data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StepResult {
    /// Creates the result of a step computed from `started_at` until now.
    #[must_use]
    pub fn completed(
        step: Step,
        started_at: DateTime<Utc>,
        data: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            step,
            started_at,
            ended_at: Utc::now(),
            data,
        }
    }

    /// Returns the computation time in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Gets a data value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// Diagnostics gathered while one step ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// The executed step.
    pub step: Step,
    /// The sheet the step ran on.
    pub sheet_id: Option<Uuid>,
    /// Wall time of the whole procedure.
    pub duration_ms: f64,
    /// Process memory after the step, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    /// The result retrieved from the sheet, absent for LOAD.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
}
