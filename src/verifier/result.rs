//! The verifier's output types: per-verification evidence and the terminal
//! [`VerificationResult`] handed to the caller and the event sink.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Error;
use crate::vc::{Status, VcType};

/// How a verification's VC status answers were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationMethod {
    /// At least one registry call was made.
    Online,
    /// Every per-VC status came from a fresh cache entry; no network call
    /// was made.
    Cached,
    /// Offline mode was explicitly enabled and the cache satisfied every
    /// check.
    Offline,
}

/// Per-VC evidence gathered during [`super::Verifier::verify`].
#[derive(Clone, Debug, PartialEq)]
pub struct VcDetail {
    /// The credential's id.
    pub vc_id: String,
    /// The credential's kind, if it was resolved at all.
    pub vc_type: Option<VcType>,
    /// The credential's issuer DID, if resolved.
    pub issuer_did: Option<String>,
    /// The credential's `issuedAt`, if resolved.
    pub issued_at: Option<i64>,
    /// The credential's lifecycle status.
    pub status: Status,
    /// Whether the issuer's own proof over this credential verified (`None`
    /// if the credential carries no proof to check).
    pub signature_valid: Option<bool>,
    /// Whether this credential's evidence came from the registry (`true`)
    /// or the cache (`false`).
    pub on_chain: bool,
}

/// The terminal outcome of a single presentation verification.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationResult {
    /// 128 random bits, hex-encoded, for log correlation.
    pub audit_id: String,
    /// When this verification ran, Unix seconds.
    pub verified_at: i64,
    /// The presentation's own `exp`, echoed back for convenience.
    pub expires_at: i64,
    /// The single bit of truth.
    pub is_valid: bool,
    /// The presenting holder's DID.
    pub holder_did: String,
    /// The presentation's own id.
    pub presentation_id: String,
    /// Whether the holder's signature over the presentation verified.
    pub signature_valid: bool,
    /// Per-VC evidence, in the order given by the presentation's `vcs`.
    pub vc_details: Vec<VcDetail>,
    /// Resolved truths of `ctx` against the union of presented VCs'
    /// `credentialSubject`. Unknown keys map to `Value::Null`.
    pub attributes: HashMap<String, Value>,
    /// How VC status answers were obtained.
    pub verification_method: VerificationMethod,
    /// Wall-clock milliseconds spent in registry calls for this
    /// verification.
    pub network_latency_ms: u64,
    /// Human-readable failure description, set iff `!is_valid`.
    pub verification_error: Option<String>,
    /// Machine-readable failure code (same code as the underlying
    /// [`Error::code`]), set iff `!is_valid`.
    pub verification_error_code: Option<String>,
}

impl VerificationResult {
    /// Whether `key` resolved `true` in `attributes` — the shape every
    /// convenience entry point (`is_age_21_plus`, ...) checks.
    #[must_use]
    pub fn attribute_is_true(&self, key: &str) -> bool {
        self.attributes.get(key) == Some(&Value::Bool(true))
    }
}

pub(super) fn failure(
    audit_id: String, verified_at: i64, holder_did: String, presentation_id: String, expires_at: i64,
    signature_valid: bool, vc_details: Vec<VcDetail>, verification_method: VerificationMethod,
    network_latency_ms: u64, error: &Error,
) -> VerificationResult {
    VerificationResult {
        audit_id,
        verified_at,
        expires_at,
        is_valid: false,
        holder_did,
        presentation_id,
        signature_valid,
        vc_details,
        attributes: HashMap::new(),
        verification_method,
        network_latency_ms,
        verification_error: Some(error.to_string()),
        verification_error_code: Some(error.code().to_string()),
    }
}
