use std::fs::Metadata;

/// NTFS records creation time for every file, so this only fails on exotic
/// mounts.
pub fn birth_time(metadata: &Metadata) -> Option<i64> {
    metadata
        .created()
        .ok()
        .map(super::system_time_secs)
}
