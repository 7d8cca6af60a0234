//! A monitor reporting step progress as events.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};

use super::{StepMonitor, StepTask};
use crate::core::StepOutcome;
use crate::errors::StepError;
use crate::events::{EventSink, StepEvent};
use crate::runner::panic_message;

/// Monitor forwarding messages and step lifecycle events to an
/// [`EventSink`].
///
/// Inline monitors run each task on the caller's thread. Background
/// monitors queue tasks to a single blocking worker, so steps still run
/// one at a time and in submission order; the worker awaits
/// [`EventSink::emit`] for completion events.
///
/// Sink calls are best-effort: a panicking sink is logged and ignored.
pub struct EventMonitor {
    sink: Arc<dyn EventSink>,
    worker: Option<Worker>,
}

struct Worker {
    queue: Mutex<Option<mpsc::UnboundedSender<StepTask>>>,
    shared: Arc<WorkerShared>,
}

#[derive(Default)]
struct WorkerShared {
    pending: AtomicUsize,
    idle: Notify,
    outcomes: Mutex<Vec<StepOutcome>>,
}

impl EventMonitor {
    /// Creates a monitor running tasks on the caller's thread.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink, worker: None }
    }

    /// Creates a monitor running tasks on a blocking worker of `handle`.
    #[must_use]
    pub fn background(sink: Arc<dyn EventSink>, handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<StepTask>();
        let shared = Arc::new(WorkerShared::default());

        let worker_sink = sink.clone();
        let worker_shared = shared.clone();
        let worker_handle = handle.clone();
        handle.spawn_blocking(move || {
            while let Some(task) = rx.blocking_recv() {
                let outcome = task.run();
                let event = StepEvent::finished(&outcome);
                publish(|| worker_handle.block_on(worker_sink.emit(event)));
                worker_shared.outcomes.lock().push(outcome);
                worker_shared.pending.fetch_sub(1, Ordering::SeqCst);
                worker_shared.idle.notify_waiters();
            }
            tracing::debug!("Step worker stopped");
        });

        Self {
            sink,
            worker: Some(Worker {
                queue: Mutex::new(Some(tx)),
                shared,
            }),
        }
    }

    /// Returns true if tasks run on a background worker.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.worker.is_some()
    }

    /// Number of queued or running tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.worker
            .as_ref()
            .map_or(0, |w| w.shared.pending.load(Ordering::SeqCst))
    }

    /// Waits until the worker has no task left, and returns the outcomes
    /// gathered since the previous call.
    pub async fn wait_idle(&self) -> Vec<StepOutcome> {
        let Some(worker) = &self.worker else {
            return Vec::new();
        };

        loop {
            let notified = worker.shared.idle.notified();
            if worker.shared.pending.load(Ordering::SeqCst) == 0 {
                break;
            }
            notified.await;
        }

        std::mem::take(&mut *worker.shared.outcomes.lock())
    }

    /// Stops accepting tasks; queued tasks still run.
    pub fn close(&self) {
        if let Some(worker) = &self.worker {
            worker.queue.lock().take();
        }
    }
}

impl StepMonitor for EventMonitor {
    fn perform(&self, task: StepTask) -> Result<Option<StepOutcome>, StepError> {
        let started = StepEvent::started(task.step(), task.param());
        publish(|| self.sink.try_emit(started));

        let Some(worker) = &self.worker else {
            let outcome = task.run();
            let finished = StepEvent::finished(&outcome);
            publish(|| self.sink.try_emit(finished));
            return Ok(Some(outcome));
        };

        let step = task.step();
        let queue = worker.queue.lock();
        let Some(tx) = queue.as_ref() else {
            return Err(StepError::Monitor(format!("worker closed, {step} not scheduled")));
        };

        worker.shared.pending.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            worker.shared.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(StepError::Monitor(format!("worker stopped, {step} not scheduled")));
        }
        Ok(None)
    }

    fn notify_msg(&self, message: &str) {
        publish(|| self.sink.try_emit(StepEvent::message(message)));
    }
}

fn publish(send: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(send)) {
        tracing::warn!(error = %panic_message(payload.as_ref()), "Event sink panicked, event dropped");
    }
}

impl std::fmt::Debug for EventMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMonitor")
            .field("background", &self.is_background())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Step, StepParam};
    use crate::events::CollectingEventSink;
    use crate::runner::StepRunner;
    use crate::sheet::{MemorySheetLoader, SheetSlot};
    use crate::testing::LogCapture;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn runner() -> StepRunner {
        StepRunner::new(Arc::new(MemorySheetLoader::new()))
    }

    #[test]
    fn test_inline_monitor_runs_on_caller_thread() {
        let sink = Arc::new(CollectingEventSink::new());
        let runner = runner();
        runner
            .binding()
            .create_monitor(|| EventMonitor::new(sink.clone()));

        let slot = SheetSlot::new();
        let outcome = runner.perform(Step::Load, &slot, Some(StepParam::source("p.png")));

        assert!(outcome.is_completed());
        assert!(slot.is_loaded());
        assert_eq!(
            sink.event_types(),
            vec!["step.started", "monitor.message", "step.completed"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_background_monitor_runs_steps_in_order() {
        let sink = Arc::new(CollectingEventSink::new());
        let runner = runner();
        let monitor = runner
            .binding()
            .create_monitor(|| EventMonitor::background(sink.clone(), &Handle::current()));
        assert!(monitor.is_background());

        let slot = SheetSlot::new();
        let outcomes = runner.run_until(Step::Skew, &slot, Some(StepParam::source("p.png")));
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, StepOutcome::Delegated { .. })));

        let done = monitor.wait_idle().await;
        let steps: Vec<_> = done.iter().map(StepOutcome::step).collect();
        assert_eq!(steps, vec![Step::Load, Step::Scale, Step::Skew]);
        assert!(done.iter().all(StepOutcome::is_completed));
        assert_eq!(slot.completed_steps(), vec![Step::Scale, Step::Skew]);
        assert_eq!(sink.events_of_type("step.completed").len(), 3);
        assert_eq!(monitor.pending(), 0);
        monitor.close();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_closed_monitor_rejects_tasks() {
        let sink = Arc::new(CollectingEventSink::new());
        let runner = runner();
        let monitor = runner
            .binding()
            .create_monitor(|| EventMonitor::background(sink.clone(), &Handle::current()));
        monitor.close();

        let outcome = runner.perform(Step::Load, &SheetSlot::new(), Some(StepParam::source("p.png")));
        assert!(matches!(outcome, StepOutcome::Failed { ref kind, .. } if kind == "Monitor"));
        assert!(monitor.wait_idle().await.is_empty());
    }

    /// Sink that panics on every event of one type.
    struct PanickingSink {
        event_type: &'static str,
        inner: CollectingEventSink,
    }

    impl PanickingSink {
        fn on(event_type: &'static str) -> Self {
            Self {
                event_type,
                inner: CollectingEventSink::new(),
            }
        }

        fn record(&self, event: StepEvent) {
            if event.event_type == self.event_type {
                panic!("sink cannot handle {}", event.event_type);
            }
            self.inner.try_emit(event);
        }
    }

    #[async_trait::async_trait]
    impl EventSink for PanickingSink {
        async fn emit(&self, event: StepEvent) {
            self.record(event);
        }

        fn try_emit(&self, event: StepEvent) {
            self.record(event);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_background_worker_survives_panicking_sink() {
        let sink = Arc::new(PanickingSink::on("step.completed"));
        let runner = runner();
        let monitor = runner
            .binding()
            .create_monitor(|| EventMonitor::background(sink.clone(), &Handle::current()));

        let slot = SheetSlot::new();
        runner.perform(Step::Load, &slot, Some(StepParam::source("p.png")));
        let first = tokio::time::timeout(Duration::from_secs(2), monitor.wait_idle())
            .await
            .expect("worker stalled after a sink panic");
        assert_eq!(first.len(), 1);
        assert_eq!(monitor.pending(), 0);

        // Later tasks still run
        runner.perform(Step::Scale, &slot, None);
        let second = tokio::time::timeout(Duration::from_secs(2), monitor.wait_idle())
            .await
            .expect("worker stopped after a sink panic");
        assert!(second[0].is_completed());
        assert_eq!(slot.completed_steps(), vec![Step::Scale]);
        monitor.close();
    }

    #[test]
    fn test_inline_monitor_contains_sink_panic() {
        let sink = Arc::new(PanickingSink::on("monitor.message"));
        let runner = runner();
        runner.binding().create_monitor(|| EventMonitor::new(sink.clone()));

        let capture = LogCapture::new();
        let slot = SheetSlot::new();
        let outcome =
            capture.in_scope(|| runner.perform(Step::Load, &slot, Some(StepParam::source("p.png"))));

        assert!(outcome.is_completed());
        assert!(slot.is_loaded());
        assert_eq!(sink.inner.event_types(), vec!["step.started", "step.completed"]);
        assert!(capture
            .at(tracing::Level::WARN)
            .iter()
            .any(|log| log.message.contains("Event sink panicked")));
    }
}
