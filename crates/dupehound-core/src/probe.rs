//! Per-path metadata probe.

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::platform;

/// One-shot latch: birth-time unavailability is warned about at most once per
/// process.
static BIRTH_TIME_WARNED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    /// Last-write time, seconds since Unix epoch.
    pub mtime: i64,
    /// Birth time, seconds since Unix epoch; 0 when the platform has none.
    pub ctime: i64,
}

/// Stat `path`. Errors mean "skip this path" and propagate to the caller.
pub fn stat(path: &Path) -> io::Result<FileMeta> {
    let metadata = std::fs::metadata(path)?;
    Ok(from_metadata(&metadata))
}

pub fn from_metadata(metadata: &Metadata) -> FileMeta {
    let mtime = metadata
        .modified()
        .map(platform::system_time_secs)
        .unwrap_or(0);

    let ctime = match platform::birth_time(metadata) {
        Some(secs) => secs,
        None => {
            if !BIRTH_TIME_WARNED.swap(true, Ordering::SeqCst) {
                warn!("filesystem does not report creation times; treating them as 0");
            }
            0
        }
    };

    FileMeta {
        size: metadata.len(),
        mtime,
        ctime,
    }
}
