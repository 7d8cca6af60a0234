//! Observability utilities: logging setup, step timing and memory usage.

mod logging;
mod memory;
mod timer;

pub use logging::init_tracing;
pub use memory::{FixedMemoryProbe, MemoryProbe, ProcessMemoryProbe};
pub use timer::SpanTimer;
