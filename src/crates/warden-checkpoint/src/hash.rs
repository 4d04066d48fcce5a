//! Canonical serialization and SHA-256 hashing.
//!
//! Two components need to agree on exactly one byte sequence for a given
//! payload body or state snapshot, across processes and across runs, for
//! hash comparisons to mean anything. [`canonical_bytes`] is that agreement:
//! object keys are sorted recursively, arrays keep their order, and numbers
//! and booleans use `serde_json`'s own textual form. [`content_hash`] layers
//! SHA-256 on top and returns the lowercase hex digest the rest of this
//! crate (and `warden-core`) stores and compares.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{CheckpointError, Result};

/// Hex-encoded SHA-256 digest.
pub type Hash = String;

/// Recursively sort object keys so two semantically-equal values serialize
/// to the same bytes regardless of field insertion order.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, normalize(v));
            }
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Deterministic byte encoding of a JSON value: sorted-key, compact JSON.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let normalized = normalize(value.clone());
    serde_json::to_vec(&normalized).map_err(CheckpointError::Serialization)
}

/// Canonical byte encoding of any serializable value.
pub fn canonical_bytes_of<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let as_value = serde_json::to_value(value).map_err(CheckpointError::Serialization)?;
    canonical_bytes(&as_value)
}

/// SHA-256 of a JSON value's canonical encoding, as lowercase hex.
pub fn content_hash(value: &Value) -> Result<Hash> {
    let bytes = canonical_bytes(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// SHA-256 of any serializable value's canonical encoding.
pub fn content_hash_of<T: Serialize>(value: &T) -> Result<Hash> {
    let bytes = canonical_bytes_of(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
