//! SHA3-256 hashing and canonical record encoding.

use crate::core::{Hash256, Result};
use serde::Serialize;
use sha3::{Digest, Sha3_256};

/// Compute SHA3-256 hash of data.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    sha3_256_multi(&[data])
}

/// Compute SHA3-256 hash of multiple data chunks.
pub fn sha3_256_multi(chunks: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash256::new(bytes)
}

/// Hash two child nodes into their parent: `H(left || right)`.
pub fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    sha3_256_multi(&[left.as_bytes(), right.as_bytes()])
}

/// Serialize a record with stable field ordering.
///
/// Going through `serde_json::Value` sorts every object's keys, so two
/// records with equal content encode identically regardless of struct
/// field order or map iteration order.
pub fn canonical_json<T: Serialize + ?Sized>(record: &T) -> Result<String> {
    let value = serde_json::to_value(record)?;
    Ok(serde_json::to_string(&value)?)
}

/// Parse `s` as an already-computed digest.
pub fn prehashed(s: &str) -> Option<Hash256> {
    if Hash256::is_hex_digest(s) {
        Hash256::from_hex(s).ok()
    } else {
        None
    }
}

/// Leaf hash of a record together with its canonical encoding.
///
/// A record that is itself a 64-character hex string is taken as an
/// already-computed digest and used verbatim; it has no encoding.
pub fn encode_record<T: Serialize + ?Sized>(record: &T) -> Result<(Hash256, Option<String>)> {
    let value = serde_json::to_value(record)?;
    if let Some(digest) = value.as_str().and_then(prehashed) {
        return Ok((digest, None));
    }
    let encoded = canonical_json(&value)?;
    Ok((sha3_256(encoded.as_bytes()), Some(encoded)))
}

/// Compute the leaf hash of a record.
pub fn hash_record<T: Serialize + ?Sized>(record: &T) -> Result<Hash256> {
    encode_record(record).map(|(hash, _)| hash)
}
