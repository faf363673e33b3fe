pub mod composite;
pub mod sample;

/// 8-byte composite/content fingerprint as stored in the index.
pub type Fingerprint = [u8; 8];

/// Sentinel stored when content sampling fails on an otherwise live record.
pub const ZERO_FINGERPRINT: Fingerprint = [0; 8];

/// Fingerprints travel as big-endian bytes so their `u64` rendering matches
/// the stored byte order.
pub fn to_u64(fp: Fingerprint) -> u64 {
    u64::from_be_bytes(fp)
}
