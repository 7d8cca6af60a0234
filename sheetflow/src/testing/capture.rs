//! Log capture for assertions on emitted tracing events.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedLog {
    /// Event level.
    pub level: Level,
    /// Formatted message.
    pub message: String,
    /// Other fields, formatted.
    pub fields: HashMap<String, String>,
}

/// A tracing layer recording every event emitted in its scope.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with this capture as the thread's subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Returns all captured events.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedLog> {
        self.records.lock().clone()
    }

    /// Returns the captured messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// Counts the events emitted at exactly `level`.
    #[must_use]
    pub fn count_at(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }

    /// Returns the events emitted at exactly `level`.
    #[must_use]
    pub fn at(&self, level: Level) -> Vec<CapturedLog> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);
        self.records.lock().push(CapturedLog {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_levels_and_fields() {
        let capture = LogCapture::new();
        capture.in_scope(|| {
            tracing::info!("first");
            tracing::warn!(step = "BARS", "second {}", 2);
        });

        assert_eq!(capture.messages(), vec!["first".to_string(), "second 2".to_string()]);
        assert_eq!(capture.count_at(Level::WARN), 1);
        let warn = &capture.at(Level::WARN)[0];
        assert_eq!(warn.fields.get("step"), Some(&"BARS".to_string()));
    }

    #[test]
    fn test_capture_is_scoped() {
        let capture = LogCapture::new();
        tracing::info!("outside");
        assert!(capture.is_empty());
    }
}
