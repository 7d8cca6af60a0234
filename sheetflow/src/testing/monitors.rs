//! Monitors for tests.

use parking_lot::Mutex;

use crate::core::{Step, StepOutcome};
use crate::errors::StepError;
use crate::monitor::{StepMonitor, StepTask};

/// A monitor recording what it is asked to do.
///
/// Inline recording monitors run each task immediately; deferred ones keep
/// the tasks until [`run_deferred`](Self::run_deferred) is called.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    inline: bool,
    performed: Mutex<Vec<Step>>,
    messages: Mutex<Vec<String>>,
    deferred: Mutex<Vec<StepTask>>,
}

impl RecordingMonitor {
    /// Creates a monitor running tasks as soon as it receives them.
    #[must_use]
    pub fn inline() -> Self {
        Self {
            inline: true,
            ..Self::default()
        }
    }

    /// Creates a monitor holding tasks back.
    #[must_use]
    pub fn deferred() -> Self {
        Self::default()
    }

    /// Steps handed to the monitor, in order.
    #[must_use]
    pub fn performed(&self) -> Vec<Step> {
        self.performed.lock().clone()
    }

    /// Messages notified to the monitor, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.deferred.lock().len()
    }

    /// Runs the held tasks in the order they were received.
    pub fn run_deferred(&self) -> Vec<StepOutcome> {
        let tasks = std::mem::take(&mut *self.deferred.lock());
        tasks.into_iter().map(StepTask::run).collect()
    }
}

impl StepMonitor for RecordingMonitor {
    fn perform(&self, task: StepTask) -> Result<Option<StepOutcome>, StepError> {
        self.performed.lock().push(task.step());
        if self.inline {
            Ok(Some(task.run()))
        } else {
            self.deferred.lock().push(task);
            Ok(None)
        }
    }

    fn notify_msg(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
