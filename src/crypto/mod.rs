//! # Cryptographic Primitives
//!
//! Signature verification (Ed25519, secp256k1), hashing and canonical JSON,
//! hex/base64 codecs, constant-time comparison, and — behind the
//! `encryption` feature — AES-256-GCM and PBKDF2 for the offline cache's
//! at-rest encryption.
//!
//! Every verify function here is total on its inputs: malformed lengths,
//! unparsable keys, or bad signatures all yield `false`. Construction-time
//! failures (e.g. a malformed already-decoded key when the caller asked for
//! strict decoding) are the only place these primitives raise an error.

mod ed25519;
mod encoding;
mod hash;
mod secp256k1;

#[cfg(feature = "encryption")]
mod aead;
#[cfg(feature = "encryption")]
mod kdf;

pub use ed25519::verify_ed25519;
pub use encoding::{base64_decode, base64_encode, constant_time_eq, from_hex, to_hex};
pub use hash::{canonical_json, double_sha256, hash_object, sha256};
pub use secp256k1::{compress_secp256k1_public_key, decompress_secp256k1_public_key, verify_secp256k1};

#[cfg(feature = "encryption")]
pub use aead::{decrypt, encrypt, AeadOutput, IV_LEN, TAG_LEN};
#[cfg(feature = "encryption")]
pub use kdf::{derive_key, KdfAlgorithm, DEFAULT_ITERATIONS, DEFAULT_KEY_LEN};

use rand::RngCore;

/// Fill `n` bytes from a cryptographically secure source.
#[must_use]
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf
}
