mod pipeline;
mod walk;

pub use pipeline::{run_content_hash_phase, run_scan_phase, ScanTotals};

pub(crate) use walk::enumerate;

/// Bounded hand-off between the enumerator and the workers. The enumerator
/// blocks when workers fall behind.
pub(crate) const QUEUE_CAPACITY: usize = 10_000;

/// Scan-phase progress is reported about once per this many files.
pub(crate) const SCAN_PROGRESS_INTERVAL: u64 = 1_000;
