//! In-memory sheet implementation.
//!
//! Results are memoized per step. The analysis itself is supplied as
//! [`StepProcessor`]s; a step without a processor completes with no data.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::{Sheet, SheetLoader, SheetSteps};
use crate::core::{Step, StepResult};
use crate::errors::StepError;

/// Results already recorded on a sheet, keyed by step.
pub type StepResults = BTreeMap<Step, StepResult>;

/// Computes the data of one step from the results of the earlier ones.
pub trait StepProcessor: Send + Sync {
    /// Runs the analysis for `step`.
    fn process(
        &self,
        step: Step,
        previous: &StepResults,
    ) -> Result<HashMap<String, serde_json::Value>, StepError>;
}

impl<F> StepProcessor for F
where
    F: Fn(Step, &StepResults) -> Result<HashMap<String, serde_json::Value>, StepError>
        + Send
        + Sync,
{
    fn process(
        &self,
        step: Step,
        previous: &StepResults,
    ) -> Result<HashMap<String, serde_json::Value>, StepError> {
        self(step, previous)
    }
}

type Processors = Arc<HashMap<Step, Arc<dyn StepProcessor>>>;

/// Memoizing step store of a [`MemorySheet`].
struct MemorySteps {
    results: StepResults,
    processors: Processors,
    displayed: Vec<Step>,
}

impl MemorySteps {
    fn compute(&mut self, step: Step) -> Result<StepResult, StepError> {
        let started = Utc::now();
        let data = match self.processors.get(&step) {
            Some(processor) => processor.process(step, &self.results)?,
            None => HashMap::new(),
        };
        let result = StepResult::completed(step, started, data);
        tracing::debug!(step = %step, compute_ms = result.duration_ms(), "Step result recorded");
        self.results.insert(step, result.clone());
        Ok(result)
    }
}

impl SheetSteps for MemorySteps {
    fn get_result(&mut self, step: Step) -> Result<StepResult, StepError> {
        if let Some(result) = self.results.get(&step) {
            return Ok(result.clone());
        }

        // Earlier steps first, LOAD is done by construction
        for &earlier in &Step::steps_through(step)[1..] {
            if earlier != step && !self.results.contains_key(&earlier) {
                tracing::debug!(step = %earlier, requested = %step, "Computing prerequisite step");
                self.compute(earlier)?;
            }
        }

        self.compute(step)
    }

    fn display_ui(&mut self, step: Step) {
        tracing::debug!(step = %step, "Display refreshed");
        self.displayed.push(step);
    }
}

/// A sheet whose step results live in memory.
pub struct MemorySheet {
    id: Uuid,
    source: PathBuf,
    steps: MemorySteps,
}

impl MemorySheet {
    /// Creates a sheet with no processors.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::with_id(Uuid::new_v4(), source.into(), Arc::new(HashMap::new()))
    }

    fn with_id(id: Uuid, source: PathBuf, processors: Processors) -> Self {
        Self {
            id,
            source,
            steps: MemorySteps {
                results: BTreeMap::new(),
                processors,
                displayed: Vec::new(),
            },
        }
    }

    /// Returns the recorded result of `step`, without computing it.
    #[must_use]
    pub fn result(&self, step: Step) -> Option<&StepResult> {
        self.steps.results.get(&step)
    }

    /// Steps whose display was refreshed, in call order.
    #[must_use]
    pub fn displayed(&self) -> &[Step] {
        &self.steps.displayed
    }
}

impl std::fmt::Debug for MemorySheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySheet")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("results", &self.steps.results.len())
            .finish()
    }
}

impl Sheet for MemorySheet {
    fn id(&self) -> Uuid {
        self.id
    }

    fn source(&self) -> &Path {
        &self.source
    }

    fn completed_steps(&self) -> Vec<Step> {
        self.steps.results.keys().copied().collect()
    }

    fn steps(&mut self) -> &mut dyn SheetSteps {
        &mut self.steps
    }
}

/// Loader building [`MemorySheet`]s.
///
/// Loading the same source again without `force` keeps the sheet id.
#[derive(Default)]
pub struct MemorySheetLoader {
    processors: HashMap<Step, Arc<dyn StepProcessor>>,
    require_existing: bool,
    known: Mutex<HashMap<PathBuf, Uuid>>,
}

impl MemorySheetLoader {
    /// Creates a loader accepting any source path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects sources that do not exist on disk.
    #[must_use]
    pub fn require_existing(mut self) -> Self {
        self.require_existing = true;
        self
    }

    /// Registers a closure as the processor of a step.
    #[must_use]
    pub fn with_processor<F>(mut self, step: Step, processor: F) -> Self
    where
        F: Fn(Step, &StepResults) -> Result<HashMap<String, serde_json::Value>, StepError>
            + Send
            + Sync
            + 'static,
    {
        self.processors.insert(step, Arc::new(processor));
        self
    }

    /// Registers a shared processor for a step.
    #[must_use]
    pub fn with_step_processor(mut self, step: Step, processor: Arc<dyn StepProcessor>) -> Self {
        self.processors.insert(step, processor);
        self
    }

    /// Number of distinct sources loaded so far.
    #[must_use]
    pub fn known_sources(&self) -> usize {
        self.known.lock().len()
    }
}

impl SheetLoader for MemorySheetLoader {
    fn load(&self, source: &Path, force: bool) -> Result<Box<dyn Sheet>, StepError> {
        if self.require_existing && !source.is_file() {
            return Err(StepError::load(source, "no such file"));
        }

        let id = {
            let mut known = self.known.lock();
            if force {
                let id = Uuid::new_v4();
                known.insert(source.to_path_buf(), id);
                id
            } else {
                *known.entry(source.to_path_buf()).or_insert_with(Uuid::new_v4)
            }
        };

        tracing::debug!(source = %source.display(), %id, force, "Sheet loaded");
        let processors = Arc::new(self.processors.clone());
        Ok(Box::new(MemorySheet::with_id(id, source.to_path_buf(), processors)))
    }
}
