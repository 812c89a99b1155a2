//! Ed25519 signature verification.

use ed25519_dalek::{Signature, VerifyingKey};

const SIGNATURE_LEN: usize = 64;
const PUBLIC_KEY_LEN: usize = 32;

/// Verify an Ed25519 signature over `message` (which the caller must already
/// have reduced to the bytes that were actually signed — typically
/// `sha256(canonicalJSON(..))` via [`crate::crypto::hash_object`]).
///
/// Total on its inputs: malformed lengths, unparsable keys, or an invalid
/// signature all yield `false` rather than panicking or raising. The empty
/// message is a valid input.
#[must_use]
pub fn verify_ed25519(signature: &[u8], message: &[u8], public_key: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LEN || public_key.len() != PUBLIC_KEY_LEN {
        return false;
    }
    let Ok(key_bytes): Result<[u8; PUBLIC_KEY_LEN], _> = public_key.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let sig_bytes: [u8; SIGNATURE_LEN] =
        signature.try_into().expect("length checked above");
    let signature = Signature::from_bytes(&sig_bytes);
    verifying_key.verify_strict(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    use super::*;

    fn keypair() -> SigningKey {
        SigningKey::generate(&mut OsRng)
    }

    #[test]
    fn round_trip() {
        let sk = keypair();
        let pk = sk.verifying_key();
        let msg = b"hello aura";
        let sig = sk.sign(msg);
        assert!(verify_ed25519(&sig.to_bytes(), msg, pk.as_bytes()));
    }

    #[test]
    fn empty_message_is_valid() {
        let sk = keypair();
        let pk = sk.verifying_key();
        let sig = sk.sign(b"");
        assert!(verify_ed25519(&sig.to_bytes(), b"", pk.as_bytes()));
    }

    #[test]
    fn tampered_message_fails() {
        let sk = keypair();
        let pk = sk.verifying_key();
        let sig = sk.sign(b"hello");
        assert!(!verify_ed25519(&sig.to_bytes(), b"hellp", pk.as_bytes()));
    }

    #[test]
    fn tampered_signature_fails() {
        let sk = keypair();
        let pk = sk.verifying_key();
        let sig = sk.sign(b"hello");
        let mut bytes = sig.to_bytes();
        bytes[0] ^= 0x01;
        assert!(!verify_ed25519(&bytes, b"hello", pk.as_bytes()));
    }

    #[test]
    fn tampered_key_fails() {
        let sk = keypair();
        let other = keypair();
        let sig = sk.sign(b"hello");
        assert!(!verify_ed25519(&sig.to_bytes(), b"hello", other.verifying_key().as_bytes()));
    }

    #[test]
    fn malformed_lengths_return_false_not_panic() {
        assert!(!verify_ed25519(&[0u8; 10], b"hello", &[0u8; 32]));
        assert!(!verify_ed25519(&[0u8; 64], b"hello", &[0u8; 5]));
    }
}
