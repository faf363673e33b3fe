#[cfg(target_os = "windows")]
pub mod windows;

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

#[cfg(target_os = "windows")]
pub fn birth_time(metadata: &Metadata) -> Option<i64> {
    windows::birth_time(metadata)
}

/// Filesystem birth time as Unix seconds, or `None` where the platform or
/// filesystem does not record one (common on older Linux filesystems).
#[cfg(not(target_os = "windows"))]
pub fn birth_time(metadata: &Metadata) -> Option<i64> {
    metadata.created().ok().map(system_time_secs)
}

pub(crate) fn system_time_secs(time: std::time::SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        // Pre-epoch timestamps come back as the negated distance.
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
