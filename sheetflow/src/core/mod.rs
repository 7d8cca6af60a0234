//! Core domain model types for sheetflow.
//!
//! This module contains:
//! - The step catalog
//! - Step parameters
//! - Step results, reports and outcomes

mod outcome;
mod param;
mod result;
mod step;

pub use outcome::StepOutcome;
pub use param::StepParam;
pub use result::{StepReport, StepResult};
pub use step::{Step, StepDescriptor};
