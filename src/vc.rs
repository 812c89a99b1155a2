//! # Verifiable Credential and DID Document data model
//!
//! Logical records as known to the verifier — resolved by id from the
//! registry or the offline cache, never minted or signed here (issuance is
//! out of scope).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The fixed set of credential kinds this verifier understands attribute
/// disclosure for.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VcType {
    /// Government-issued identity document.
    GovernmentId,
    /// Biometric liveness/uniqueness credential.
    Biometric,
    /// Proof-of-humanity attestation.
    ProofOfHumanity,
    /// Age-assertion credential (e.g. "over 21").
    AgeAssertion,
}

/// Lifecycle status of a credential as reported by the registry.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No status has been determined.
    #[default]
    Unspecified,
    /// The credential is valid and unrevoked.
    Active,
    /// The credential has been revoked by its issuer.
    Revoked,
    /// The credential's validity period has lapsed.
    Expired,
    /// The credential is temporarily suspended.
    Suspended,
    /// The credential is still being issued/anchored.
    Pending,
}

impl Status {
    /// Only `Active` contributes to a positive verification outcome.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// An issuer's proof over a credential: a signature plus a reference to the
/// verification method that should validate it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Proof {
    /// Hex-encoded signature bytes.
    pub signature: String,
    /// DID URL of the verification method (e.g. `did:aura:testnet:issuer#key-1`).
    pub verification_method: String,
}

/// A Verifiable Credential as known to the verifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifiableCredential {
    /// The credential's id, as referenced from a presentation's `vcs` list.
    pub vc_id: String,
    /// The DID of the credential's issuer.
    pub issuer_did: String,
    /// The DID of the credential's subject (holder).
    pub holder_did: String,
    /// The kind of claim this credential attests.
    pub vc_type: VcType,
    /// Unix seconds at issuance.
    pub issued_at: i64,
    /// Unix seconds after which the credential is no longer valid, if any.
    pub expires_at: Option<i64>,
    /// Opaque claims about the subject (the holder discloses a subset via a
    /// presentation's `ctx`).
    pub credential_subject: HashMap<String, serde_json::Value>,
    /// The issuer's signature over this credential, if the registry exposes
    /// one for client-side re-verification.
    pub proof: Option<Proof>,
    /// This credential's position within its issuer's revocation bitmap, if
    /// the registry assigns one. See DESIGN.md open-question 1.
    pub credential_index: Option<u64>,
}

#[derive(Serialize)]
struct VcSignedFields<'a> {
    vc_id: &'a str,
    issuer_did: &'a str,
    holder_did: &'a str,
    vc_type: VcType,
    issued_at: i64,
    expires_at: Option<i64>,
    credential_subject: &'a HashMap<String, serde_json::Value>,
}

impl VerifiableCredential {
    /// `sha256(canonicalJSON({vcId, issuerDID, holderDID, vcType, issuedAt,
    /// expiresAt, credentialSubject}))` — the message an issuer's `proof`
    /// signs over. `proof` itself is excluded, the same way a
    /// presentation's `sig` excludes itself from its own signing hash.
    pub fn signing_hash(&self) -> crate::error::Result<[u8; 32]> {
        let fields = VcSignedFields {
            vc_id: &self.vc_id,
            issuer_did: &self.issuer_did,
            holder_did: &self.holder_did,
            vc_type: self.vc_type,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            credential_subject: &self.credential_subject,
        };
        crate::crypto::hash_object(&fields)
    }
}

/// A cryptographic key type a DID document's verification method may carry.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    /// Ed25519.
    Ed25519,
    /// secp256k1.
    Secp256k1,
}

/// A single verification method entry in a [`DidDocument`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerificationMethod {
    /// The method's DID URL id.
    pub id: String,
    /// The key algorithm.
    pub key_type: KeyType,
    /// The DID that controls this key.
    pub controller: String,
    /// Raw public key bytes.
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
}

/// A resolved DID document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DidDocument {
    /// The subject DID.
    pub id: String,
    /// An optional controlling DID.
    pub controller: Option<String>,
    /// Keys this DID publishes.
    pub verification_method: Vec<VerificationMethod>,
    /// Ids (from `verification_method`) authorized to authenticate as this
    /// DID.
    pub authentication: Vec<String>,
    /// Service endpoints; opaque to this verifier.
    pub service: Vec<serde_json::Value>,
}

impl DidDocument {
    /// The verification method usable to authenticate as this DID, if any
    /// of `authentication` resolves to an entry in `verification_method`.
    #[must_use]
    pub fn authentication_key(&self) -> Option<&VerificationMethod> {
        self.authentication.iter().find_map(|method_id| {
            self.verification_method.iter().find(|vm| &vm.id == method_id)
        })
    }

    /// Look up a verification method by its exact DID URL id, for
    /// validating an issuer `proof` (which need not reference an
    /// `authentication` key).
    #[must_use]
    pub fn find_verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// DID format: `did:aura:<network>:<identifier>`, network lowercase-alpha,
/// identifier from `[A-Za-z0-9._-]`.
pub fn is_valid_did(did: &str) -> bool {
    did_regex().is_match(did)
}

fn did_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^did:aura:[a-z]+:[A-Za-z0-9._-]+$").expect("valid static regex")
    })
}
