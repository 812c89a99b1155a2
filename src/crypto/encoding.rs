//! Hex/base64 codecs and constant-time comparison.

use base64ct::{Base64, Encoding};

use crate::error::{Error, Result};

/// Encode bytes as lowercase hex.
#[must_use]
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string. Rejects odd length and non-hex-alphabet characters;
/// never panics on malformed input.
pub fn from_hex(input: &str) -> Result<Vec<u8>> {
    hex::decode(input).map_err(|e| Error::Encoding(format!("invalid hex: {e}")))
}

/// Encode bytes as standard (padded) base64.
#[must_use]
pub fn base64_encode(bytes: &[u8]) -> String {
    Base64::encode_string(bytes)
}

/// Decode standard-alphabet base64, tolerating missing padding and embedded
/// whitespace (as produced by QR scanners that wrap long strings).
pub fn base64_decode(input: &str) -> Result<Vec<u8>> {
    let mut cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    while cleaned.len() % 4 != 0 {
        cleaned.push('=');
    }
    Base64::decode_vec(&cleaned).map_err(|e| Error::Encoding(format!("invalid base64: {e}")))
}

/// Compare two byte slices in constant time. The length check may
/// short-circuit (lengths are not secret); the byte-by-byte comparison does
/// not.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
