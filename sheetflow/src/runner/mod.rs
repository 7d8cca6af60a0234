//! Step execution.
//!
//! [`StepRunner`] is the coordination layer between a pipeline driver and
//! the sheets: it makes sure a sheet exists, triggers the step computation,
//! keeps the monitor informed and contains every failure. No error raised
//! while a step runs is propagated to the caller; it is logged and turned
//! into a [`StepOutcome`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::core::{Step, StepOutcome, StepParam, StepReport};
use crate::errors::StepError;
use crate::monitor::{MonitorBinding, StepTask};
use crate::observability::{MemoryProbe, ProcessMemoryProbe, SpanTimer};
use crate::sheet::{Sheet, SheetLoader, SheetSlot};

/// Runs steps on sheets.
///
/// Cloning is cheap; clones share the loader, the monitor binding and the
/// memory probe.
#[derive(Clone)]
pub struct StepRunner {
    loader: Arc<dyn SheetLoader>,
    binding: MonitorBinding,
    probe: Arc<dyn MemoryProbe>,
    config: RunnerConfig,
}

impl StepRunner {
    /// Creates a runner with its own, unbound, monitor binding.
    #[must_use]
    pub fn new(loader: Arc<dyn SheetLoader>) -> Self {
        Self {
            loader,
            binding: MonitorBinding::new(),
            probe: Arc::new(ProcessMemoryProbe),
            config: RunnerConfig::default(),
        }
    }

    /// Uses the given monitor binding, e.g. [`MonitorBinding::process`].
    #[must_use]
    pub fn with_binding(mut self, binding: MonitorBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Uses the given memory probe for diagnostics.
    #[must_use]
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Sets the runner configuration.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// The monitor binding consulted by this runner.
    #[must_use]
    pub fn binding(&self) -> &MonitorBinding {
        &self.binding
    }

    /// The runner configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Notifies a message to the monitor, or to the log without one.
    pub fn notify(&self, message: &str) {
        self.binding.notify(message);
    }

    /// Triggers the execution of `step`.
    ///
    /// With a bound monitor, the request is handed to it and the monitor
    /// eventually runs [`do_perform`](Self::do_perform). Without one,
    /// `do_perform` is called directly.
    pub fn perform(&self, step: Step, slot: &SheetSlot, param: Option<StepParam>) -> StepOutcome {
        let Some(monitor) = self.binding.current() else {
            return self.do_perform(step, slot, param.as_ref());
        };

        let task = StepTask::new(self.clone(), step, slot.clone(), param);
        match monitor.perform(task) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => StepOutcome::Delegated { step },
            Err(err) if err.is_reported() => {
                // User has already been informed of error details
                tracing::debug!(step = %step, error = %err, "Step failure already reported");
                StepOutcome::from_error(step, &err)
            }
            Err(err) => {
                tracing::warn!(step = %step, error = %err, "Monitor could not perform step {}", step);
                StepOutcome::from_error(step, &err)
            }
        }
    }

    /// Performs `step` and contains any failure.
    ///
    /// Step failures have already been shown to the user and are only
    /// recorded in the outcome. Any other error, panics included, is
    /// logged as a warning naming the step.
    pub fn do_perform(
        &self,
        step: Step,
        slot: &SheetSlot,
        param: Option<&StepParam>,
    ) -> StepOutcome {
        let run = panic::catch_unwind(AssertUnwindSafe(|| self.do_step(step, slot, param)));

        match run {
            Ok(Ok(report)) => StepOutcome::Completed(report),
            Ok(Err(err)) if err.is_reported() => {
                tracing::debug!(step = %step, error = %err, "Step failure already reported");
                StepOutcome::from_error(step, &err)
            }
            Ok(Err(err)) => {
                tracing::warn!(step = %step, error = %err, "Error in performing step {}", step);
                StepOutcome::from_error(step, &err)
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::warn!(step = %step, error = %reason, "Panic in performing step {}", step);
                StepOutcome::Failed {
                    step,
                    kind: "Panic".to_string(),
                    reason,
                }
            }
        }
    }

    /// Runs one step, without failure containment.
    ///
    /// Only LOAD may run on an empty slot, and it needs a
    /// [`StepParam::Source`]; the new sheet is stored in the slot for the
    /// following steps.
    pub fn do_step(
        &self,
        step: Step,
        slot: &SheetSlot,
        param: Option<&StepParam>,
    ) -> Result<StepReport, StepError> {
        let timer = SpanTimer::start(step);
        tracing::debug!(step = %step, "{} Starting", step);

        self.notify(&self.progress_message(step, param));

        let mut guard = slot.lock();
        if guard.is_none() {
            *guard = Some(self.load_sheet(step, param)?);
        }
        let sheet = guard.as_mut().ok_or(StepError::MissingSheet { step })?;

        let result = if step.is_load() {
            tracing::debug!(step = %step, sheet = %sheet.id(), "Sheet available");
            None
        } else {
            Some(sheet.steps().get_result(step)?)
        };

        if self.config.display_ui && self.binding.is_bound() {
            sheet.steps().display_ui(step);
        }

        let sheet_id = sheet.id();
        drop(guard);

        let duration_ms = timer.finish();
        let memory_bytes = if self.config.diagnostics {
            let bytes = self.probe.used_bytes();
            tracing::debug!(
                step = %step,
                duration_ms,
                memory_bytes = ?bytes,
                "{} completed in {:.0} ms",
                step,
                duration_ms
            );
            bytes
        } else {
            None
        };

        Ok(StepReport {
            step,
            sheet_id: Some(sheet_id),
            duration_ms,
            memory_bytes,
            result,
        })
    }

    /// Performs every step from LOAD up to `target`, in catalog order.
    ///
    /// LOAD is skipped when the slot already holds a sheet. Stops after the
    /// first failing step. Delegated steps are not waited for; their order
    /// is left to the monitor.
    pub fn run_until(
        &self,
        target: Step,
        slot: &SheetSlot,
        source: Option<StepParam>,
    ) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();

        for &step in Step::steps_through(target) {
            if step.is_load() && slot.is_loaded() {
                tracing::debug!(step = %step, "Sheet already loaded");
                continue;
            }

            let param = if step.is_load() { source.clone() } else { None };
            let outcome = self.perform(step, slot, param);
            let failed = outcome.is_failure();
            outcomes.push(outcome);

            if failed {
                tracing::info!(step = %step, target = %target, "Stopping before {}", target);
                break;
            }
        }

        outcomes
    }

    fn load_sheet(
        &self,
        step: Step,
        param: Option<&StepParam>,
    ) -> Result<Box<dyn Sheet>, StepError> {
        if !step.is_load() {
            return Err(StepError::MissingSheet { step });
        }
        let source = param
            .and_then(StepParam::as_source)
            .ok_or(StepError::MissingSource { step })?;

        self.loader.load(source, false)
    }

    fn progress_message(&self, step: Step, param: Option<&StepParam>) -> String {
        match param {
            Some(param) if self.config.notify_params => format!("{step} {param}"),
            _ => step.to_string(),
        }
    }
}

impl std::fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner")
            .field("binding", &self.binding)
            .field("probe", &self.probe)
            .field("config", &self.config)
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
