use crossbeam_channel::Sender;
use glob::Pattern;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cancel::CancelToken;
use crate::progress::ProgressReporter;

/// Breadth-first enumerator: one thread walking the tree and feeding file
/// paths into the bounded queue.
///
/// Per directory, child directories are queued for later traversal first,
/// then the files are yielded. Unreadable directories are reported and
/// skipped; the walk continues with the remaining siblings. Stops early when
/// the token is cancelled or every worker is gone.
pub(crate) fn enumerate(
    root: &Path,
    ignore_patterns: &[Pattern],
    tx: Sender<PathBuf>,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) {
    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    pending.push_back(root.to_path_buf());

    while let Some(dir) = pending.pop_front() {
        if cancel.is_cancelled() {
            break;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read directory {}: {}", dir.display(), e);
                reporter.on_path_error(&dir, &e);
                continue;
            }
        };

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("error listing {}: {}", dir.display(), e);
                    reporter.on_path_error(&dir, &e);
                    continue;
                }
            };

            let path = entry.path();
            if is_ignored(&path, ignore_patterns) {
                continue;
            }

            // file_type on the dirent does not follow symlinks, so a link to
            // a directory is handed to the workers like any other path and
            // never traversed (no cycles).
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => pending.push_back(path),
                Ok(_) => files.push(path),
                Err(e) => {
                    warn!("cannot classify {}: {}", path.display(), e);
                    reporter.on_path_error(&path, &e);
                }
            }
        }

        for file in files {
            if tx.send(file).is_err() {
                // All workers exited; nothing left to feed.
                return;
            }
        }
    }
}

fn is_ignored(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}
