//! Monitor support.
//!
//! A monitor is an optional interactive observer. When one is bound, step
//! requests are handed to it instead of being run directly, and progress
//! messages go to it instead of the log.

mod binding;
mod event_monitor;
mod task;

pub use binding::MonitorBinding;
pub use event_monitor::EventMonitor;
pub use task::StepTask;

use crate::core::StepOutcome;
use crate::errors::StepError;

/// Observer mediating step execution and progress display.
#[cfg_attr(test, mockall::automock)]
pub trait StepMonitor: Send + Sync {
    /// Takes charge of a step request.
    ///
    /// The monitor must eventually call [`StepTask::run`]. It returns the
    /// outcome when it ran the task before returning, `None` when the task
    /// was scheduled elsewhere.
    fn perform(&self, task: StepTask) -> Result<Option<StepOutcome>, StepError>;

    /// Displays a message, which may be unrelated to any step.
    fn notify_msg(&self, message: &str);
}
