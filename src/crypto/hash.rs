//! SHA-256 primitives and RFC-8785-style JSON canonicalization.
//!
//! Canonicalization relies on `serde_json`'s default (non-`preserve_order`)
//! `Map` representation, which is a `BTreeMap` — object keys are already
//! lexicographically sorted at every nesting level once a value round-trips
//! through [`serde_json::Value`], and `serde_json::to_string` never emits
//! insignificant whitespace. That is exactly the canonical form this
//! crate's signatures are computed over.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// SHA-256 applied twice.
#[must_use]
pub fn double_sha256(bytes: &[u8]) -> [u8; 32] {
    sha256(&sha256(bytes))
}

/// Serialize `value` to its canonical JSON byte form: sorted keys at every
/// level, no insignificant whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let as_value: Value =
        serde_json::to_value(value).map_err(|e| Error::Encoding(format!("not serializable: {e}")))?;
    serde_json::to_string(&as_value).map_err(|e| Error::Encoding(format!("not serializable: {e}")))
}

/// `sha256(canonicalJSON(value))` — the single input to every
/// hash-then-sign computation in this crate.
pub fn hash_object<T: Serialize>(value: &T) -> Result<[u8; 32]> {
    Ok(sha256(canonical_json(value)?.as_bytes()))
}
