//! AES-256-GCM authenticated encryption.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};

use crate::error::{Error, Result};

/// IV length for AES-GCM, in bytes.
pub const IV_LEN: usize = 12;
/// Tag length for AES-GCM, in bytes.
pub const TAG_LEN: usize = 16;

/// The output of [`encrypt`]: IV, ciphertext, and detached authentication
/// tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AeadOutput {
    /// The 12-byte IV used for this encryption.
    pub iv: [u8; IV_LEN],
    /// The ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
    /// The 16-byte authentication tag.
    pub tag: [u8; TAG_LEN],
}

/// Encrypt `plaintext` under `key` with the given `iv`, optionally binding
/// `aad` (additional authenticated data) into the tag.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32], iv: &[u8; IV_LEN], aad: Option<&[u8]>) -> Result<AeadOutput> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);
    let payload = Payload { msg: plaintext, aad: aad.unwrap_or(&[]) };
    let mut combined = cipher
        .encrypt(nonce, payload)
        .map_err(|_| Error::Encoding("AEAD encryption failed".into()))?;
    let tag_bytes = combined.split_off(combined.len() - TAG_LEN);
    let tag: [u8; TAG_LEN] = tag_bytes.try_into().expect("fixed tag length");
    Ok(AeadOutput { iv: *iv, ciphertext: combined, tag })
}

/// Decrypt and authenticate a ciphertext produced by [`encrypt`]. Fails with
/// a single opaque [`Error::DecryptionFailed`] on any authentication
/// failure — no partial plaintext is ever returned, to avoid a decryption
/// oracle.
pub fn decrypt(
    ciphertext: &[u8], tag: &[u8; TAG_LEN], key: &[u8; 32], iv: &[u8; IV_LEN], aad: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    let payload = Payload { msg: &combined, aad: aad.unwrap_or(&[]) };
    cipher.decrypt(nonce, payload).map_err(|_| Error::DecryptionFailed)
}
