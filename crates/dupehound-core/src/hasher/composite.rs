use std::hash::Hasher as _;
use twox_hash::XxHash64;

use super::Fingerprint;
use crate::config::HashComponents;

/// Mix the selected components into the 8-byte composite fingerprint.
///
/// Inputs are fed in a fixed canonical order — size, ctime, mtime,
/// case-folded file name, content fingerprint — so the result is reproducible
/// across runs and platforms. A disabled component contributes nothing (not a
/// zero placeholder), so differing masks hash into independent namespaces.
pub fn mix(
    mask: HashComponents,
    size: u64,
    ctime: i64,
    mtime: i64,
    file_name: &str,
    content: Option<Fingerprint>,
) -> Fingerprint {
    let mut hasher = XxHash64::with_seed(0);

    if mask.contains(HashComponents::SIZE) {
        hasher.write(&size.to_le_bytes());
    }
    if mask.contains(HashComponents::CREATED) {
        hasher.write(&ctime.to_le_bytes());
    }
    if mask.contains(HashComponents::MODIFIED) {
        hasher.write(&mtime.to_le_bytes());
    }
    if mask.contains(HashComponents::FILE_NAME) {
        hasher.write(file_name.to_lowercase().as_bytes());
    }
    if mask.contains(HashComponents::CONTENT) {
        if let Some(fp) = content {
            hasher.write(&fp);
        }
    }

    hasher.finish().to_be_bytes()
}
