//! PBKDF2 key derivation, for turning a user-supplied passphrase into a
//! cache encryption key.

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;
/// Default derived-key length, in bytes.
pub const DEFAULT_KEY_LEN: usize = 32;

/// The PBKDF2 PRF to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KdfAlgorithm {
    /// PBKDF2 with HMAC-SHA-256.
    Pbkdf2Sha256,
    /// PBKDF2 with HMAC-SHA-512.
    Pbkdf2Sha512,
}

/// Derive a key of `key_len` bytes from `password` and `salt`.
#[must_use]
pub fn derive_key(
    password: &[u8], salt: &[u8], iterations: u32, key_len: usize, algo: KdfAlgorithm,
) -> Vec<u8> {
    let mut out = vec![0u8; key_len];
    match algo {
        KdfAlgorithm::Pbkdf2Sha256 => {
            pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password, salt, iterations, &mut out);
        }
        KdfAlgorithm::Pbkdf2Sha512 => {
            pbkdf2::pbkdf2_hmac::<sha2::Sha512>(password, salt, iterations, &mut out);
        }
    }
    out
}
