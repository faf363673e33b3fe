use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use twox_hash::XxHash64;

use super::Fingerprint;

/// Fixed sample window size.
pub const CHUNK_SIZE: u64 = 64 * 1024;

const MIN_CHUNKS: u32 = 3;
const MAX_CHUNKS: u32 = 100;
const CHUNKS_PER_DOUBLING: u32 = 3;

/// Number of sample chunks for a file of `len` bytes.
///
/// Files up to one chunk are read whole. Larger files get
/// `clamp(floor(log2(len in MiB)) * 3, 3, 100)` chunks, so read volume grows
/// logarithmically with file size.
pub fn chunk_count(len: u64) -> u32 {
    if len <= CHUNK_SIZE {
        return 1;
    }
    let mib = len >> 20;
    if mib < 2 {
        return MIN_CHUNKS;
    }
    (mib.ilog2() * CHUNKS_PER_DOUBLING).clamp(MIN_CHUNKS, MAX_CHUNKS)
}

/// Offsets of the sample chunks, increasing, none extending past EOF.
pub fn chunk_offsets(len: u64) -> Vec<u64> {
    if len <= CHUNK_SIZE {
        return vec![0];
    }
    let k = u64::from(chunk_count(len));
    let stride = len / k;
    (0..k).map(|i| (i * stride).min(len - CHUNK_SIZE)).collect()
}

/// Streaming sampled content fingerprint of `path`.
///
/// Chunks are fed to the hash in offset order; the caller decides what to do
/// with read failures (the pipeline stores the zero sentinel).
pub fn fingerprint_file(path: &Path) -> io::Result<Fingerprint> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut hasher = XxHash64::with_seed(0);
    let mut buf = vec![0u8; CHUNK_SIZE as usize];

    for offset in chunk_offsets(len) {
        let want = CHUNK_SIZE.min(len - offset) as usize;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf[..want])?;
        hasher.write(&buf[..want]);
    }

    Ok(hasher.finish().to_be_bytes())
}
