//! Step lifecycle events.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{Step, StepOutcome, StepParam};

/// An event describing step progress, consumed by event sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// The event type (e.g., "step.started", "step.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (RFC 3339).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl StepEvent {
    /// Creates a new event with no data.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the step named in the payload, if any.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        self.data
            .get("step")
            .and_then(serde_json::Value::as_str)
            .and_then(|id| id.parse().ok())
    }

    /// Creates a "step.started" event.
    #[must_use]
    pub fn started(step: Step, param: Option<&StepParam>) -> Self {
        let event = Self::new("step.started")
            .add_data("step", serde_json::json!(step.id()))
            .add_data("description", serde_json::json!(step.description()));
        match param {
            Some(param) => event.add_data("param", serde_json::json!(param.to_string())),
            None => event,
        }
    }

    /// Creates the event closing a step: "step.completed", "step.delegated"
    /// or "step.failed".
    #[must_use]
    pub fn finished(outcome: &StepOutcome) -> Self {
        let event_type = match outcome {
            StepOutcome::Completed(_) => "step.completed",
            StepOutcome::Delegated { .. } => "step.delegated",
            StepOutcome::Reported { .. } | StepOutcome::Failed { .. } => "step.failed",
        };
        let mut event = Self::new(event_type);
        event.data = outcome.to_dict();
        event
    }

    /// Creates a "monitor.message" event.
    #[must_use]
    pub fn message(text: &str) -> Self {
        Self::new("monitor.message").add_data("message", serde_json::json!(text))
    }
}
