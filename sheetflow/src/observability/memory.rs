//! Process memory usage, for step diagnostics.

use std::fmt::Debug;

/// Reports how much memory the process currently uses.
pub trait MemoryProbe: Send + Sync + Debug {
    /// Resident memory in bytes, if it can be determined.
    fn used_bytes(&self) -> Option<u64>;
}

/// Reads the resident set size from `/proc/self/status`.
///
/// Yields `None` on platforms without procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn used_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }
}

/// A probe returning a fixed value, for tests and platforms without procfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMemoryProbe(pub Option<u64>);

impl MemoryProbe for FixedMemoryProbe {
    fn used_bytes(&self) -> Option<u64> {
        self.0
    }
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") | None => Some(value * 1024),
        Some(_) => None,
    }
}
