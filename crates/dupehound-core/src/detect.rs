//! Streams duplicate groups out of the index without materializing the full
//! result set.

use std::collections::VecDeque;

use crate::error::Error;
use crate::hasher;
use crate::store::{FileRecord, Index};

/// Buckets fetched per store round-trip. Memory is bounded by this times the
/// largest group, not by the total number of groups.
const BUCKET_BATCH: usize = 100;

/// ≥2 live records sharing a grouping key.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Shared size (by-size mode) or the first member's size (by-hash mode).
    pub size: u64,
    /// Composite fingerprint as a big-endian u64; `None` in by-size mode.
    pub hash: Option<u64>,
    /// Members, path ascending.
    pub files: Vec<FileRecord>,
}

enum Mode {
    BySize,
    ByHash,
}

/// Lazy sequence of duplicate groups, in store bucket order.
///
/// Groups are pulled in batches of [`BUCKET_BATCH`] buckets; the consumer
/// drives iteration and may stop at any point. Buckets whose membership
/// falls under 2 after the live filter are suppressed.
pub struct GroupStream<'a> {
    index: &'a Index,
    mode: Mode,
    offset: usize,
    ready: VecDeque<DuplicateGroup>,
    exhausted: bool,
}

impl<'a> GroupStream<'a> {
    fn new(index: &'a Index, mode: Mode) -> Self {
        Self {
            index,
            mode,
            offset: 0,
            ready: VecDeque::new(),
            exhausted: false,
        }
    }

    fn refill(&mut self) -> Result<(), Error> {
        match self.mode {
            Mode::BySize => {
                let sizes = self.index.duplicate_sizes(BUCKET_BATCH, self.offset)?;
                self.exhausted = sizes.is_empty();
                self.offset += sizes.len();
                for size in sizes {
                    let files = self.index.files_of_size(size)?;
                    if files.len() >= 2 {
                        self.ready.push_back(DuplicateGroup {
                            size,
                            hash: None,
                            files,
                        });
                    }
                }
            }
            Mode::ByHash => {
                let hashes = self.index.duplicate_hashes(BUCKET_BATCH, self.offset)?;
                self.exhausted = hashes.is_empty();
                self.offset += hashes.len();
                for hash in hashes {
                    let files = self.index.files_of_hash(&hash)?;
                    if files.len() >= 2 {
                        self.ready.push_back(DuplicateGroup {
                            size: files[0].size,
                            hash: Some(hasher::to_u64(hash)),
                            files,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Iterator for GroupStream<'_> {
    type Item = Result<DuplicateGroup, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.ready.is_empty() && !self.exhausted {
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.ready.pop_front().map(Ok)
    }
}

/// Groups of live records sharing a composite fingerprint, largest bucket
/// size first.
pub fn by_hash(index: &Index) -> GroupStream<'_> {
    GroupStream::new(index, Mode::ByHash)
}

/// Groups of live records sharing a size. Not part of the default pipeline;
/// kept for diagnostics and future modes.
pub fn by_size(index: &Index) -> GroupStream<'_> {
    GroupStream::new(index, Mode::BySize)
}

/// Group totals without materializing any bucket contents.
pub fn count_by_hash(index: &Index) -> Result<u64, Error> {
    Ok(index.count_duplicate_hashes()?)
}

pub fn count_by_size(index: &Index) -> Result<u64, Error> {
    Ok(index.count_duplicate_sizes()?)
}
