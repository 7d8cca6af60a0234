//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, Level};

use super::StepEvent;

/// Trait for sinks receiving step events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: StepEvent);

    /// Emits an event without blocking.
    ///
    /// This method must never fail; errors are logged and suppressed.
    fn try_emit(&self, event: StepEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: StepEvent) {}

    fn try_emit(&self, _event: StepEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &StepEvent) {
        let step = event.step().map(|s| s.id()).unwrap_or("-");
        if self.level == Level::DEBUG {
            debug!(event_type = %event.event_type, step, event_data = ?event.data, "Event: {}", event.event_type);
        } else {
            info!(event_type = %event.event_type, step, event_data = ?event.data, "Event: {}", event.event_type);
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: StepEvent) {
        self.log_event(&event);
    }

    fn try_emit(&self, event: StepEvent) {
        self.log_event(&event);
    }
}

/// A collecting event sink for tests and replay.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<StepEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<StepEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns the types of the collected events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<StepEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: StepEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: StepEvent) {
        self.events.write().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Step;

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(StepEvent::message("x")).await;
        sink.try_emit(StepEvent::started(Step::Load, None));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        sink.emit(StepEvent::started(Step::Scale, None)).await;
        sink.try_emit(StepEvent::message("hello"));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(StepEvent::started(Step::Load, None)).await;
        sink.try_emit(StepEvent::message("LOAD page.png"));
        sink.try_emit(StepEvent::started(Step::Scale, None));

        assert_eq!(sink.len(), 3);
        assert_eq!(
            sink.event_types(),
            vec!["step.started", "monitor.message", "step.started"]
        );
        assert_eq!(sink.events_of_type("step.").len(), 2);
    }
}
