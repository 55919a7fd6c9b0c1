//! SHA-256 content digests.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Digest of the compact JSON serialisation of `value`.
///
/// Only used on types whose serialisation has a fixed field order (structs
/// and sequences, no hash maps), so the output is stable.
pub fn json_digest<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    Ok(sha256_hex(&bytes))
}

/// First 12 hex characters, for log lines and file headers.
pub fn short(digest: &str) -> &str {
    &digest[..12.min(digest.len())]
}
