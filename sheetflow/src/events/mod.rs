//! Step event emission.
//!
//! Monitors translate step progress into [`StepEvent`]s and hand them to an
//! [`EventSink`] for logging, display or analytics.

mod event;
mod sink;

pub use event::StepEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
