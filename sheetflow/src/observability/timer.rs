//! Step timing.

use std::time::Instant;

use crate::core::Step;

/// Measures the wall time of one step execution.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    step: Step,
}

impl SpanTimer {
    /// Starts a new timer for `step`.
    #[must_use]
    pub fn start(step: Step) -> Self {
        Self {
            start: Instant::now(),
            step,
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the timed step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Finishes the timer and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
