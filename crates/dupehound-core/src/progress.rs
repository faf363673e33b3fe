use std::io;
use std::path::Path;

/// Sink for pipeline progress and per-path trouble.
///
/// The CLI implements this with indicatif; all methods default to no-ops so
/// library consumers only override what they render. Counters reported here
/// are monotone non-decreasing within a phase.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_progress(&self, _scanned: u64, _updated: u64, _skipped: u64) {}
    fn on_scan_complete(&self, _scanned: u64, _duration_secs: f64) {}
    fn on_hash_start(&self, _total_files: u64) {}
    fn on_hash_progress(&self, _hashed: u64, _total_files: u64) {}
    fn on_hash_complete(&self, _hashed: u64, _duration_secs: f64) {}
    /// A path that had to be skipped (unreadable file or directory).
    fn on_path_error(&self, _path: &Path, _error: &io::Error) {}
    fn on_sweep_complete(&self, _removed: usize) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
