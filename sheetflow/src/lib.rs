//! # Sheetflow
//!
//! Step coordination for an optical music recognition pipeline.
//!
//! A sheet goes through a fixed, ordered catalog of processing steps, from
//! loading the picture to building the score. Sheetflow provides:
//!
//! - **Step catalog**: the closed set of steps, looked up by identifier
//! - **Step execution**: lazy sheet loading, timing and failure containment
//! - **Monitor binding**: optional observer that takes charge of step requests
//! - **Event monitor**: a monitor turning step activity into events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetflow::prelude::*;
//!
//! let runner = StepRunner::new(Arc::new(MemorySheetLoader::new()));
//! let slot = SheetSlot::new();
//!
//! let outcomes = runner.run_until(Step::Score, &slot, Some(StepParam::source("page.png")));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod monitor;
pub mod observability;
pub mod runner;
pub mod sheet;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LogConfig, LogFormat, RunnerConfig, SheetflowConfig};
    pub use crate::core::{
        Step, StepDescriptor, StepOutcome, StepParam, StepReport, StepResult,
    };
    pub use crate::errors::{SheetflowError, StepError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, StepEvent,
    };
    pub use crate::monitor::{EventMonitor, MonitorBinding, StepMonitor, StepTask};
    pub use crate::observability::{init_tracing, MemoryProbe, SpanTimer};
    pub use crate::runner::StepRunner;
    pub use crate::sheet::{MemorySheet, MemorySheetLoader, Sheet, SheetLoader, SheetSlot, SheetSteps};
}
