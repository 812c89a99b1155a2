//! secp256k1 (ECDSA) signature verification and public-key compression.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use k256::PublicKey;

use crate::crypto::hash::sha256;
use crate::error::{Error, Result};

const COMPRESSED_LEN: usize = 33;
const UNCOMPRESSED_LEN: usize = 65;
const COMPACT_SIG_LEN: usize = 64;

fn is_valid_key_shape(key: &[u8]) -> bool {
    match key.len() {
        COMPRESSED_LEN => key[0] == 0x02 || key[0] == 0x03,
        UNCOMPRESSED_LEN => key[0] == 0x04,
        _ => false,
    }
}

/// Verify a secp256k1 ECDSA signature. `public_key` must be 33-byte
/// compressed (`0x02`/`0x03` prefix) or 65-byte uncompressed (`0x04`
/// prefix) SEC1. `signature` may be 64-byte compact `r||s` or DER. When
/// `hash_message` is set, `message` is SHA-256 hashed before verification;
/// otherwise `message` is treated as an already-computed 32-byte digest.
///
/// Total on its inputs — malformed shapes yield `false`, never a panic.
#[must_use]
pub fn verify_secp256k1(
    signature: &[u8], message: &[u8], public_key: &[u8], hash_message: bool,
) -> bool {
    if !is_valid_key_shape(public_key) {
        return false;
    }
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let digest = if hash_message { sha256(message).to_vec() } else { message.to_vec() };

    let parsed_sig = if signature.len() == COMPACT_SIG_LEN {
        Signature::from_slice(signature).ok()
    } else {
        Signature::from_der(signature).ok()
    };
    let Some(signature) = parsed_sig else {
        return false;
    };

    verifying_key.verify_prehash(&digest, &signature).is_ok()
}

/// Compress a secp256k1 public key. A no-op (returns the input unchanged) if
/// it is already compressed.
pub fn compress_secp256k1_public_key(key: &[u8]) -> Result<Vec<u8>> {
    if key.len() == COMPRESSED_LEN && (key[0] == 0x02 || key[0] == 0x03) {
        return Ok(key.to_vec());
    }
    if !is_valid_key_shape(key) {
        return Err(Error::PublicKey("not a valid secp256k1 public key".into()));
    }
    let public_key = PublicKey::from_sec1_bytes(key)
        .map_err(|e| Error::PublicKey(format!("invalid secp256k1 public key: {e}")))?;
    Ok(public_key.to_encoded_point(true).as_bytes().to_vec())
}

/// Decompress a secp256k1 public key. A no-op if already uncompressed.
pub fn decompress_secp256k1_public_key(key: &[u8]) -> Result<Vec<u8>> {
    if key.len() == UNCOMPRESSED_LEN && key[0] == 0x04 {
        return Ok(key.to_vec());
    }
    if !is_valid_key_shape(key) {
        return Err(Error::PublicKey("not a valid secp256k1 public key".into()));
    }
    let public_key = PublicKey::from_sec1_bytes(key)
        .map_err(|e| Error::PublicKey(format!("invalid secp256k1 public key: {e}")))?;
    Ok(public_key.to_encoded_point(false).as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;

    use super::*;

    fn keypair() -> SigningKey {
        SigningKey::random(&mut OsRng)
    }

    #[test]
    fn round_trip_compressed() {
        let sk = keypair();
        let pk = sk.verifying_key().to_encoded_point(true);
        let digest = sha256(b"hello aura");
        let sig: Signature = sk.sign_prehash(&digest).unwrap();
        assert!(verify_secp256k1(&sig.to_bytes(), &digest, pk.as_bytes(), false));
    }

    #[test]
    fn round_trip_uncompressed_with_hashing() {
        let sk = keypair();
        let pk = sk.verifying_key().to_encoded_point(false);
        let message = b"hello aura";
        let digest = sha256(message);
        let sig: Signature = sk.sign_prehash(&digest).unwrap();
        assert!(verify_secp256k1(&sig.to_bytes(), message, pk.as_bytes(), true));
    }

    #[test]
    fn tampered_signature_fails() {
        let sk = keypair();
        let pk = sk.verifying_key().to_encoded_point(true);
        let digest = sha256(b"hello");
        let sig: Signature = sk.sign_prehash(&digest).unwrap();
        let mut bytes = sig.to_bytes();
        bytes[0] ^= 0xff;
        assert!(!verify_secp256k1(&bytes, &digest, pk.as_bytes(), false));
    }

    #[test]
    fn malformed_key_returns_false() {
        assert!(!verify_secp256k1(&[0u8; 64], b"x", &[0u8; 10], true));
    }

    #[test]
    fn compress_decompress_round_trip_and_idempotence() {
        let sk = keypair();
        let compressed = sk.verifying_key().to_encoded_point(true).as_bytes().to_vec();
        let uncompressed = decompress_secp256k1_public_key(&compressed).unwrap();
        assert_eq!(compress_secp256k1_public_key(&uncompressed).unwrap(), compressed);
        // Idempotent on an already-compressed input.
        assert_eq!(compress_secp256k1_public_key(&compressed).unwrap(), compressed);
    }
}
