//! The sheet boundary.
//!
//! A sheet is the unit of work the steps apply to. The coordinator never
//! looks inside it: it only builds one through a [`SheetLoader`] and asks
//! its [`SheetSteps`] store for per-step results.

mod memory;

pub use memory::{MemorySheet, MemorySheetLoader, StepProcessor, StepResults};

use parking_lot::{Mutex, MutexGuard};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{Step, StepResult};
use crate::errors::StepError;

/// Per-sheet store of step results.
pub trait SheetSteps: Send {
    /// Produces, or retrieves if already known, the result of `step`.
    ///
    /// A [`StepError::StepFailure`] means the user has already been told
    /// what went wrong.
    fn get_result(&mut self, step: Step) -> Result<StepResult, StepError>;

    /// Refreshes any observer-facing display for `step`.
    fn display_ui(&mut self, step: Step);
}

/// A unit of work processed by the steps.
pub trait Sheet: Send + Debug {
    /// Unique identifier of this sheet.
    fn id(&self) -> Uuid;

    /// The file the sheet was loaded from.
    fn source(&self) -> &Path;

    /// Steps whose result is currently recorded, in chronological order.
    fn completed_steps(&self) -> Vec<Step>;

    /// Gives access to the step result store.
    fn steps(&mut self) -> &mut dyn SheetSteps;
}

/// Builds sheets from their source file.
pub trait SheetLoader: Send + Sync {
    /// Loads a sheet from `source`; `force` asks for a fresh load even if
    /// the source is already known.
    fn load(&self, source: &Path, force: bool) -> Result<Box<dyn Sheet>, StepError>;
}

/// Shared, possibly empty, reference to the sheet of a pipeline run.
///
/// LOAD fills it; every later step of the same run reuses its content.
#[derive(Debug, Clone, Default)]
pub struct SheetSlot {
    inner: Arc<Mutex<Option<Box<dyn Sheet>>>>,
}

impl SheetSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot holding an existing sheet.
    #[must_use]
    pub fn with_sheet(sheet: Box<dyn Sheet>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(sheet))),
        }
    }

    /// Returns true if a sheet is present.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Returns the id of the held sheet.
    #[must_use]
    pub fn sheet_id(&self) -> Option<Uuid> {
        self.inner.lock().as_ref().map(|sheet| sheet.id())
    }

    /// Returns the steps completed on the held sheet.
    #[must_use]
    pub fn completed_steps(&self) -> Vec<Step> {
        self.inner
            .lock()
            .as_ref()
            .map(|sheet| sheet.completed_steps())
            .unwrap_or_default()
    }

    /// Removes and returns the held sheet.
    pub fn take(&self) -> Option<Box<dyn Sheet>> {
        self.inner.lock().take()
    }

    /// Locks the slot for the duration of a step.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Sheet>>> {
        self.inner.lock()
    }

    /// Returns true if both handles point to the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let slot = SheetSlot::new();
        assert!(!slot.is_loaded());
        assert_eq!(slot.sheet_id(), None);
        assert!(slot.completed_steps().is_empty());
    }

    #[test]
    fn test_slot_clones_share_the_sheet() {
        let sheet = MemorySheet::new("page-1.png");
        let id = sheet.id();
        let slot = SheetSlot::with_sheet(Box::new(sheet));
        let other = slot.clone();

        assert!(slot.same_slot(&other));
        assert_eq!(other.sheet_id(), Some(id));

        let taken = slot.take();
        assert!(taken.is_some());
        assert!(!other.is_loaded());
    }
}
