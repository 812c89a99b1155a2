//! The orchestrator: drives parse → validate → freshness/nonce →
//! signature → status → policy, per the state machine in spec §4.5.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::config::{VerifierConfig, VerifyRequest};
use super::result::{failure, VcDetail, VerificationMethod, VerificationResult};
use crate::cache::Cache;
use crate::crypto;
use crate::error::{Error, Result};
use crate::events::{emit_guarded, Event, EventSink};
use crate::nonce::{ExactNonceTracker, NonceConfig, NonceTracker};
use crate::presentation::{self, ParseOptions, Presentation};
use crate::registry::RegistryClient;
use crate::vc::{DidDocument, KeyType, Status, VcType, VerifiableCredential};

/// The verifier orchestrator (component E). Owns the nonce tracker and the
/// offline cache; borrows a [`RegistryClient`] and an optional
/// [`EventSink`].
pub struct Verifier<R: RegistryClient> {
    config: VerifierConfig,
    nonce_tracker: Arc<dyn NonceTracker>,
    cache: Arc<Cache>,
    registry: Arc<R>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<R: RegistryClient> Verifier<R> {
    /// Build a verifier with the default exact nonce tracker.
    pub fn new(config: VerifierConfig, cache: Arc<Cache>, registry: Arc<R>) -> Self {
        let nonce_config = NonceConfig {
            window_ms: config.nonce_window_secs * 1000,
            clock_skew_ms: config.clock_skew_secs * 1000,
            cleanup_interval_ms: config.cleanup_interval_ms,
        };
        Self {
            config,
            nonce_tracker: Arc::new(ExactNonceTracker::new(nonce_config)),
            cache,
            registry,
            sink: None,
        }
    }

    /// Use a caller-supplied nonce tracker backend (e.g. the bloom-filter
    /// variant) instead of the default exact one.
    #[must_use]
    pub fn with_nonce_tracker(mut self, tracker: Arc<dyn NonceTracker>) -> Self {
        self.nonce_tracker = tracker;
        self
    }

    /// Attach an [`EventSink`] so completed verifications emit
    /// `verification` events.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the full verification pipeline. Always returns a
    /// `VerificationResult` — per-verification errors are captured into
    /// `isValid=false`/`verificationError`, never raised.
    pub async fn verify(&self, request: VerifyRequest) -> VerificationResult {
        let now = now_secs();
        let audit_id = crypto::to_hex(&crypto::random_bytes(16));
        let result = tokio::time::timeout(self.config.timeout, self.verify_inner(&request, now, &audit_id))
            .await
            .unwrap_or_else(|_| self.early_failure(&audit_id, now, "", "", 0, &Error::Timeout));

        if let Some(sink) = &self.sink {
            emit_guarded(sink.as_ref(), Event::Verification(Box::new(result.clone())));
        }
        result
    }

    fn early_failure(
        &self, audit_id: &str, now: i64, holder_did: &str, presentation_id: &str, expires_at: i64, error: &Error,
    ) -> VerificationResult {
        failure(
            audit_id.to_string(),
            now,
            holder_did.to_string(),
            presentation_id.to_string(),
            expires_at,
            false,
            Vec::new(),
            VerificationMethod::Cached,
            0,
            error,
        )
    }

    async fn verify_inner(&self, request: &VerifyRequest, now: i64, audit_id: &str) -> VerificationResult {
        // --- Parsed / Validated ---
        let parse_options = ParseOptions { supported_versions: self.config.supported_versions.clone(), tolerance_seconds: 0 };
        let presentation = match presentation::parse(&request.qr_code_data, &parse_options, now) {
            Ok(p) => p,
            Err(e) => return self.early_failure(audit_id, now, "", "", 0, &e),
        };

        // --- Fresh ---
        if let Err(e) = check_freshness(&presentation, now, self.config.clock_skew_secs) {
            return self.early_failure(audit_id, now, &presentation.h, &presentation.p, presentation.exp, &e);
        }

        // --- NonceOk ---
        let nonce_key = presentation.nonce_key();
        if let Err(failure_kind) = self.nonce_tracker.validate_nonce(&nonce_key, now * 1000) {
            return self.early_failure(
                audit_id, now, &presentation.h, &presentation.p, presentation.exp, &Error::Nonce(failure_kind),
            );
        }

        // --- SignatureOk ---
        let mut network_latency_ms: u64 = 0;
        let (holder_doc, _from_cache) = match self.resolve_did(&presentation.h, &mut network_latency_ms).await {
            Ok(doc) => doc,
            Err(e) => {
                return self.early_failure(audit_id, now, &presentation.h, &presentation.p, presentation.exp, &e)
            }
        };
        let signature_valid = match presentation_signature_valid(&presentation, &holder_doc) {
            Ok(valid) => valid,
            Err(e) => {
                return self.early_failure(audit_id, now, &presentation.h, &presentation.p, presentation.exp, &e)
            }
        };
        if !signature_valid {
            return self.early_failure(
                audit_id, now, &presentation.h, &presentation.p, presentation.exp,
                &Error::Signature("holder signature did not verify".to_string()),
            );
        }

        // --- CredentialsChecked ---
        let mut vc_details = Vec::with_capacity(presentation.vcs.len());
        let mut subjects: Vec<HashMap<String, Value>> = Vec::with_capacity(presentation.vcs.len());
        let mut any_network_call = false;
        for vc_id in &presentation.vcs {
            let (detail, subject, from_network) =
                self.check_vc(vc_id, now, &mut network_latency_ms).await;
            any_network_call |= from_network;
            if let Some(subject) = subject {
                subjects.push(subject);
            }
            vc_details.push(detail);
        }

        let verification_method = if self.config.offline {
            VerificationMethod::Offline
        } else if any_network_call {
            VerificationMethod::Online
        } else {
            VerificationMethod::Cached
        };

        // --- Valid (policy) ---
        let policy_error = check_policy(request, &vc_details, now);
        let attributes = derive_attributes(&presentation, &subjects);

        let is_valid = policy_error.is_none();
        VerificationResult {
            audit_id: audit_id.to_string(),
            verified_at: now,
            expires_at: presentation.exp,
            is_valid,
            holder_did: presentation.h.clone(),
            presentation_id: presentation.p.clone(),
            signature_valid,
            vc_details,
            attributes,
            verification_method,
            network_latency_ms,
            verification_error: policy_error.as_ref().map(ToString::to_string),
            verification_error_code: policy_error.as_ref().map(|e| e.code().to_string()),
        }
    }

    async fn resolve_did(&self, did: &str, network_latency_ms: &mut u64) -> Result<(DidDocument, bool)> {
        if self.config.offline {
            return self
                .cache
                .get_did_document(did)?
                .map(|d| (d, true))
                .ok_or(Error::OfflineModeUnavailable);
        }
        let started = Instant::now();
        let resolved = self.registry.resolve_did(did).await;
        *network_latency_ms += started.elapsed().as_millis() as u64;
        match resolved {
            Ok(Some(doc)) => {
                let _ = self.cache.set_did_document(did, &doc);
                Ok((doc, false))
            }
            Ok(None) => Err(Error::DidNotFound(did.to_string())),
            Err(e) => match self.cache.get_did_document(did) {
                Ok(Some(doc)) => Ok((doc, true)),
                _ => Err(e),
            },
        }
    }

    /// Resolve one referenced VC's status and (if present) verify its
    /// issuer proof. Returns the evidence, the credential's subject claims
    /// (when resolved), and whether a registry call was made.
    async fn check_vc(
        &self, vc_id: &str, now: i64, network_latency_ms: &mut u64,
    ) -> (VcDetail, Option<HashMap<String, Value>>, bool) {
        if let Ok(Some(cached)) = self.cache.get(vc_id, now) {
            let is_revoked = self
                .cache
                .is_revoked(vc_id, now)
                .ok()
                .flatten()
                .unwrap_or(cached.revocation_status.is_revoked);
            let status = derive_cached_status(&cached, is_revoked, now);
            let signature_valid = self.verify_vc_proof(&cached.credential, network_latency_ms).await;
            let detail = VcDetail {
                vc_id: vc_id.to_string(),
                vc_type: Some(cached.credential.vc_type),
                issuer_did: Some(cached.credential.issuer_did.clone()),
                issued_at: Some(cached.credential.issued_at),
                status,
                signature_valid,
                on_chain: false,
            };
            return (detail, Some(cached.credential.credential_subject.clone()), false);
        }

        if self.config.offline {
            let detail = VcDetail {
                vc_id: vc_id.to_string(),
                vc_type: None,
                issuer_did: None,
                issued_at: None,
                status: Status::Unspecified,
                signature_valid: None,
                on_chain: false,
            };
            return (detail, None, false);
        }

        let started = Instant::now();
        let report = self.registry.check_vc_status(vc_id).await;
        *network_latency_ms += started.elapsed().as_millis() as u64;

        let Ok(report) = report else {
            let detail = VcDetail {
                vc_id: vc_id.to_string(),
                vc_type: None,
                issuer_did: None,
                issued_at: None,
                status: Status::Unspecified,
                signature_valid: None,
                on_chain: true,
            };
            return (detail, None, true);
        };

        let status = if report.revoked { Status::Revoked } else { report.status };
        let signature_valid = if let Some(vc) = &report.vc {
            self.verify_vc_proof(vc, network_latency_ms).await
        } else {
            None
        };
        let (vc_type, issuer_did, issued_at, subject) = report
            .vc
            .as_ref()
            .map(|vc| (Some(vc.vc_type), Some(vc.issuer_did.clone()), Some(vc.issued_at), Some(vc.credential_subject.clone())))
            .unwrap_or((None, None, None, None));

        if let Some(vc) = report.vc.clone() {
            const FRESHLY_RESOLVED_MAX_AGE_SECS: i64 = 3600;
            let entry = crate::cache::CachedCredential {
                revocation_status: crate::cache::RevocationStatus {
                    is_revoked: report.revoked,
                    checked_at: now,
                    merkle_root: None,
                },
                ..crate::cache::CachedCredential::new(vc, now, FRESHLY_RESOLVED_MAX_AGE_SECS)
            };
            let _ = self.cache.set(vc_id, entry, now);
        }

        let detail = VcDetail { vc_id: vc_id.to_string(), vc_type, issuer_did, issued_at, status, signature_valid, on_chain: true };
        (detail, subject, true)
    }

    async fn verify_vc_proof(&self, vc: &VerifiableCredential, network_latency_ms: &mut u64) -> Option<bool> {
        let proof = vc.proof.as_ref()?;
        let issuer_doc = if let Ok(Some(doc)) = self.cache.get_did_document(&vc.issuer_did) {
            doc
        } else if !self.config.offline {
            let started = Instant::now();
            let resolved = self.registry.resolve_did(&vc.issuer_did).await;
            *network_latency_ms += started.elapsed().as_millis() as u64;
            let Ok(Some(doc)) = resolved else { return Some(false) };
            let _ = self.cache.set_did_document(&vc.issuer_did, &doc);
            doc
        } else {
            return Some(false);
        };
        let Some(method) = issuer_doc.find_verification_method(&proof.verification_method) else {
            return Some(false);
        };
        let Ok(signature) = crypto::from_hex(&proof.signature) else { return Some(false) };
        let Ok(message) = vc.signing_hash() else { return Some(false) };
        Some(verify_with_key_type(method.key_type, &signature, &message, &method.public_key))
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}

fn check_freshness(presentation: &Presentation, now: i64, clock_skew_secs: i64) -> Result<()> {
    let time_since_expiration = now - presentation.exp;
    if time_since_expiration > clock_skew_secs {
        return Err(Error::Expired {
            expiration_time: presentation.exp,
            current_time: now,
            time_since_expiration,
        });
    }
    Ok(())
}

fn verify_with_key_type(key_type: KeyType, signature: &[u8], message: &[u8], public_key: &[u8]) -> bool {
    match key_type {
        KeyType::Ed25519 => crypto::verify_ed25519(signature, message, public_key),
        KeyType::Secp256k1 => crypto::verify_secp256k1(signature, message, public_key, false),
    }
}

fn presentation_signature_valid(presentation: &Presentation, holder_doc: &DidDocument) -> Result<bool> {
    let Some(method) = holder_doc.authentication_key() else {
        return Err(Error::PublicKey("holder DID document has no authentication key".to_string()));
    };
    let signature = presentation.signature_bytes()?;
    let message = presentation.signing_hash()?;
    Ok(verify_with_key_type(method.key_type, &signature, &message, &method.public_key))
}

fn derive_cached_status(cached: &crate::cache::CachedCredential, is_revoked: bool, now: i64) -> Status {
    if is_revoked {
        return Status::Revoked;
    }
    if let Some(expires_at) = cached.metadata.credential_expires_at {
        if now >= expires_at {
            return Status::Expired;
        }
    }
    Status::Active
}

fn check_policy(request: &VerifyRequest, vc_details: &[VcDetail], now: i64) -> Option<Error> {
    for detail in vc_details {
        if detail.status != Status::Active {
            return Some(match detail.status {
                Status::Revoked => Error::Revoked { vc_id: detail.vc_id.clone() },
                Status::Expired => Error::CredentialExpired { vc_id: detail.vc_id.clone() },
                Status::Suspended => Error::Suspended { vc_id: detail.vc_id.clone() },
                Status::Pending => Error::Pending { vc_id: detail.vc_id.clone() },
                Status::Unspecified => Error::NotFound { vc_id: detail.vc_id.clone() },
                Status::Active => unreachable!("filtered above"),
            });
        }
        if detail.signature_valid == Some(false) {
            return Some(Error::Signature(format!("issuer proof for {} did not verify", detail.vc_id)));
        }
        if let Some(max_age) = request.max_credential_age_secs {
            if let Some(issued_at) = detail.issued_at {
                if now - issued_at > max_age {
                    return Some(Error::CredentialExpired { vc_id: detail.vc_id.clone() });
                }
            }
        }
    }

    let presented_types: std::collections::HashSet<VcType> =
        vc_details.iter().filter_map(|d| d.vc_type).collect();
    for required in &request.required_vc_types {
        if !presented_types.contains(required) {
            return Some(Error::Validation(format!("required VC type {required:?} was not presented")));
        }
    }
    None
}

/// Turn a disclosure-context key (`show_age_over_21`) into the attribute
/// name it resolves to (`ageOver21`): strip a `show_` prefix, then
/// snake_case -> camelCase.
fn disclosure_attribute_name(ctx_key: &str) -> String {
    let stripped = ctx_key.strip_prefix("show_").unwrap_or(ctx_key);
    let mut out = String::with_capacity(stripped.len());
    let mut capitalize_next = false;
    for ch in stripped.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn derive_attributes(presentation: &Presentation, subjects: &[HashMap<String, Value>]) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();
    for (ctx_key, disclose) in &presentation.ctx {
        if !disclose {
            continue;
        }
        let attribute_name = disclosure_attribute_name(ctx_key);
        let value = subjects
            .iter()
            .find_map(|subject| subject.get(&attribute_name).cloned())
            .unwrap_or(Value::Null);
        attributes.insert(attribute_name, value);
    }
    attributes
}
