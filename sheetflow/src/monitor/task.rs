//! A step request handed to a monitor.

use crate::core::{Step, StepOutcome, StepParam};
use crate::runner::StepRunner;
use crate::sheet::SheetSlot;

/// Everything needed to run one step later, possibly on another thread.
pub struct StepTask {
    runner: StepRunner,
    step: Step,
    slot: SheetSlot,
    param: Option<StepParam>,
}

impl StepTask {
    pub(crate) fn new(
        runner: StepRunner,
        step: Step,
        slot: SheetSlot,
        param: Option<StepParam>,
    ) -> Self {
        Self {
            runner,
            step,
            slot,
            param,
        }
    }

    /// The requested step.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// The step parameter.
    #[must_use]
    pub fn param(&self) -> Option<&StepParam> {
        self.param.as_ref()
    }

    /// The sheet slot the step runs on.
    #[must_use]
    pub fn slot(&self) -> &SheetSlot {
        &self.slot
    }

    /// Runs the step with failure containment.
    pub fn run(self) -> StepOutcome {
        self.runner.do_perform(self.step, &self.slot, self.param.as_ref())
    }
}

impl std::fmt::Debug for StepTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepTask")
            .field("step", &self.step)
            .field("param", &self.param)
            .finish()
    }
}
