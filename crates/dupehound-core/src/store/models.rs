use crate::hasher::Fingerprint;
use std::path::Path;

/// One row of the `files` table: a path the index has seen, with the
/// metadata and composite fingerprint of its most recent observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub size: u64,
    pub mtime: i64,
    pub ctime: i64,
    pub hash: Option<Fingerprint>,
    pub scan_id: i64,
}

impl FileRecord {
    /// Basename of the recorded path, as used for the file-name component.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.path.as_str())
    }
}
