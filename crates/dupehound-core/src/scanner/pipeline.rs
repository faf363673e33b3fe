use crossbeam_channel::Receiver;
use glob::Pattern;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use tracing::{debug, warn};

use super::{enumerate, QUEUE_CAPACITY, SCAN_PROGRESS_INTERVAL};
use crate::cancel::CancelToken;
use crate::config::HashComponents;
use crate::error::Error;
use crate::hasher::{composite, sample, Fingerprint, ZERO_FINGERPRINT};
use crate::probe;
use crate::progress::ProgressReporter;
use crate::store::{FileRecord, Index};

/// Duplicate-size buckets are pulled from the store this many at a time
/// during the content-hash phase.
const BUCKET_BATCH: usize = 100;

/// Final counter values for one scan phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    /// Paths taken off the queue and classified.
    pub scanned: u64,
    /// Records inserted or refreshed.
    pub updated: u64,
    /// Unchanged files satisfied from the cache.
    pub skipped: u64,
    /// Paths dropped because they could not be read.
    pub errors: u64,
}

#[derive(Default)]
struct Counters {
    scanned: AtomicU64,
    updated: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ScanTotals {
        ScanTotals {
            scanned: self.scanned.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn bump_scanned(&self, reporter: &dyn ProgressReporter) {
        let scanned = self.scanned.fetch_add(1, Ordering::Relaxed) + 1;
        if scanned % SCAN_PROGRESS_INTERVAL == 0 {
            reporter.on_scan_progress(
                scanned,
                self.updated.load(Ordering::Relaxed),
                self.skipped.load(Ordering::Relaxed),
            );
        }
    }
}

/// Phase one: enumerate the tree and classify every file against the index.
///
/// One enumerator feeds a bounded queue; `workers` consumers drain it, each
/// with its own store connection. Returns the final counter values; when the
/// token is cancelled the totals cover the work done so far.
pub fn run_scan_phase(
    index: &Index,
    root: &Path,
    mask: HashComponents,
    workers: usize,
    incremental: bool,
    ignore_patterns: &[Pattern],
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<ScanTotals, Error> {
    let counters = Counters::default();
    let (tx, rx) = crossbeam_channel::bounded::<PathBuf>(QUEUE_CAPACITY);

    thread::scope(|scope| {
        let counters = &counters;
        let mut handles = Vec::with_capacity(workers.max(1));
        for _ in 0..workers.max(1) {
            let rx = rx.clone();
            let store = index.reopen()?;
            handles.push(scope.spawn(move || {
                worker_loop(store, mask, incremental, rx, counters, reporter, cancel)
            }));
        }
        // Workers own their clones now; the enumerator's sender going out of
        // scope is what closes the queue.
        drop(rx);

        enumerate(root, ignore_patterns, tx, reporter, cancel);

        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(Error::WorkerPanic),
            }
        }
        Ok(())
    })?;

    Ok(counters.snapshot())
}

fn worker_loop(
    store: Index,
    mask: HashComponents,
    incremental: bool,
    rx: Receiver<PathBuf>,
    counters: &Counters,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<(), Error> {
    for path in rx.iter() {
        if cancel.is_cancelled() {
            break;
        }
        classify_path(&store, mask, incremental, &path, counters, reporter)?;
    }
    Ok(())
}

fn classify_path(
    store: &Index,
    mask: HashComponents,
    incremental: bool,
    path: &Path,
    counters: &Counters,
    reporter: &dyn ProgressReporter,
) -> Result<(), Error> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            reporter.on_path_error(path, &e);
            counters.errors.fetch_add(1, Ordering::Relaxed);
            counters.bump_scanned(reporter);
            return Ok(());
        }
    };

    // The enumerator hands over symlinks unresolved; anything that is not a
    // regular file after following them is not indexed.
    if !metadata.is_file() {
        return Ok(());
    }

    let meta = probe::from_metadata(&metadata);
    let path_str = path.to_string_lossy();

    if incremental {
        if let Some(existing) = store.get_by_path(&path_str)? {
            if existing.size == meta.size
                && existing.mtime == meta.mtime
                && existing.ctime == meta.ctime
            {
                store.touch_scan(&path_str)?;
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                counters.bump_scanned(reporter);
                return Ok(());
            }
        }
    }

    if mask.contains(HashComponents::CONTENT) {
        // Content hashing is deferred to phase two; a previously computed
        // fingerprint survives this upsert.
        store.upsert(&path_str, meta.size, meta.mtime, meta.ctime, None)?;
    } else {
        let hash = composite::mix(mask, meta.size, meta.ctime, meta.mtime, base_name(path), None);
        store.upsert(&path_str, meta.size, meta.mtime, meta.ctime, Some(&hash))?;
    }
    counters.updated.fetch_add(1, Ordering::Relaxed);
    counters.bump_scanned(reporter);
    Ok(())
}

fn base_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Phase two: confirm duplicate-size candidates by sampled content.
///
/// Iterates duplicate-size buckets in store order, fans the sampling out
/// over a pool of `workers` threads, and writes the recomputed composite
/// back serially. Unreadable files get the zero sentinel and the phase
/// carries on. Returns the number of files hashed.
pub fn run_content_hash_phase(
    index: &Index,
    mask: HashComponents,
    workers: usize,
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<u64, Error> {
    let total = index.count_duplicate_size_files()?;
    reporter.on_hash_start(total);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("dupehound-hash-{i}"))
        .build()
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut hashed = 0u64;
    let mut offset = 0usize;

    'buckets: loop {
        let sizes = index.duplicate_sizes(BUCKET_BATCH, offset)?;
        if sizes.is_empty() {
            break;
        }
        offset += sizes.len();

        for size in sizes {
            if cancel.is_cancelled() {
                break 'buckets;
            }

            let records = index.files_of_size(size)?;
            debug!("hashing {} candidates of size {}", records.len(), size);

            let results: Vec<(String, Fingerprint)> = pool.install(|| {
                records
                    .par_iter()
                    .filter(|_| !cancel.is_cancelled())
                    .map(|record| (record.path.clone(), content_composite(mask, record)))
                    .collect()
            });

            for (path, hash) in results {
                index.update_hash(&path, &hash)?;
                hashed += 1;
                reporter.on_hash_progress(hashed, total);
            }
        }
    }

    Ok(hashed)
}

fn content_composite(mask: HashComponents, record: &FileRecord) -> Fingerprint {
    match sample::fingerprint_file(Path::new(&record.path)) {
        Ok(fp) => composite::mix(
            mask,
            record.size,
            record.ctime,
            record.mtime,
            record.file_name(),
            Some(fp),
        ),
        Err(e) => {
            warn!("content sampling failed for {}: {}", record.path, e);
            ZERO_FINGERPRINT
        }
    }
}
