//! Monitor binding holder.

use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

use super::StepMonitor;

static PROCESS_BINDING: OnceLock<MonitorBinding> = OnceLock::new();

/// Holds the active monitor, if any.
///
/// Clones share the same binding. Installing a monitor replaces the
/// previous one and is immediately visible to every clone on every thread.
#[derive(Clone, Default)]
pub struct MonitorBinding {
    current: Arc<RwLock<Option<Arc<dyn StepMonitor>>>>,
}

impl MonitorBinding {
    /// Creates an unbound holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the binding shared by the whole process.
    #[must_use]
    pub fn process() -> Self {
        PROCESS_BINDING.get_or_init(Self::new).clone()
    }

    /// Builds a monitor, installs it and returns it.
    pub fn create_monitor<M, F>(&self, factory: F) -> Arc<M>
    where
        M: StepMonitor + 'static,
        F: FnOnce() -> M,
    {
        let monitor = Arc::new(factory());
        self.install(monitor.clone());
        monitor
    }

    /// Installs a monitor, replacing any previous one.
    pub fn install(&self, monitor: Arc<dyn StepMonitor>) {
        if self.current.write().replace(monitor).is_some() {
            tracing::debug!("Previous step monitor replaced");
        }
    }

    /// Returns the active monitor.
    #[must_use]
    pub fn current(&self) -> Option<Arc<dyn StepMonitor>> {
        self.current.read().clone()
    }

    /// Returns true if a monitor is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.current.read().is_some()
    }

    /// Sends a message to the monitor, or to the log when there is none.
    pub fn notify(&self, message: &str) {
        match self.current() {
            Some(monitor) => monitor.notify_msg(message),
            None => tracing::info!("{}", message),
        }
    }
}

impl std::fmt::Debug for MonitorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorBinding")
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MockStepMonitor;
    use crate::testing::{LogCapture, RecordingMonitor};

    #[test]
    fn test_unbound_by_default() {
        let binding = MonitorBinding::new();
        assert!(!binding.is_bound());
        assert!(binding.current().is_none());
    }

    #[test]
    fn test_create_monitor_last_write_wins() {
        let binding = MonitorBinding::new();
        let first = binding.create_monitor(RecordingMonitor::deferred);
        let second = binding.create_monitor(RecordingMonitor::deferred);

        assert!(!Arc::ptr_eq(&first, &second));

        let second_dyn: Arc<dyn StepMonitor> = second.clone();
        let current = binding.current().unwrap();
        assert!(Arc::ptr_eq(&current, &second_dyn));

        binding.notify("hello");
        assert!(first.messages().is_empty());
        assert_eq!(second.messages(), vec!["hello".to_string()]);
    }

    #[test]
    fn test_clones_see_installed_monitor() {
        let binding = MonitorBinding::new();
        let clone = binding.clone();
        binding.create_monitor(RecordingMonitor::deferred);
        assert!(clone.is_bound());
    }

    #[test]
    fn test_install_is_visible_across_threads() {
        let binding = MonitorBinding::new();
        let reader = binding.clone();
        std::thread::spawn(move || {
            binding.create_monitor(RecordingMonitor::deferred);
        })
        .join()
        .unwrap();
        assert!(reader.is_bound());
    }

    #[test]
    fn test_notify_without_monitor_logs_info() {
        let binding = MonitorBinding::new();
        let capture = LogCapture::new();
        capture.in_scope(|| binding.notify("SCALE"));

        assert_eq!(capture.count_at(tracing::Level::INFO), 1);
        assert_eq!(capture.messages(), vec!["SCALE".to_string()]);
    }

    #[test]
    fn test_notify_with_monitor_does_not_log() {
        let mut mock = MockStepMonitor::new();
        mock.expect_notify_msg()
            .withf(|msg| msg == "LOAD page.png")
            .times(1)
            .return_const(());

        let binding = MonitorBinding::new();
        binding.install(Arc::new(mock));

        let capture = LogCapture::new();
        capture.in_scope(|| binding.notify("LOAD page.png"));
        assert_eq!(capture.count_at(tracing::Level::INFO), 0);
    }

    #[test]
    fn test_process_binding_is_shared() {
        let a = MonitorBinding::process();
        let b = MonitorBinding::process();
        assert!(Arc::ptr_eq(&a.current, &b.current));
    }
}
