//! End-to-end scenarios driving [`Verifier::verify`] through its public API:
//! a holder's QR payload in, a `VerificationResult` out. Mirrors the
//! reference codebase's `tests/vp_verify.rs` harness, with an in-memory
//! registry double standing in for the on-chain identity registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ed25519_dalek::Signer;
use serde_json::json;

use aura_verifier::cache::{Cache, CacheConfigBuilder, InMemoryAdapter};
use aura_verifier::error::Result;
use aura_verifier::registry::{RegistryClient, VcStatusReport};
use aura_verifier::vc::{DidDocument, KeyType, Status, VcType, VerifiableCredential, VerificationMethod};
use aura_verifier::{Verifier, VerifierConfigBuilder, VerifyRequest};

fn now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_secs() as i64
}

/// An in-memory stand-in for the on-chain registry: callers seed DID
/// documents and VC status reports up front, and every call is counted so
/// tests can assert a scenario never touched the network.
#[derive(Default)]
struct MockRegistry {
    dids: Mutex<HashMap<String, DidDocument>>,
    statuses: Mutex<HashMap<String, VcStatusReport>>,
    calls: AtomicUsize,
    network_down: std::sync::atomic::AtomicBool,
}

impl MockRegistry {
    fn with_did(self, doc: DidDocument) -> Self {
        self.dids.lock().unwrap().insert(doc.id.clone(), doc);
        self
    }

    fn with_status(self, vc_id: &str, report: VcStatusReport) -> Self {
        self.statuses.lock().unwrap().insert(vc_id.to_string(), report);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simulate the registry becoming unreachable: every call still counts,
    /// but resolves as a node-unavailable error instead of real data.
    fn disable_network(&self) {
        self.network_down.store(true, Ordering::SeqCst);
    }
}

impl RegistryClient for MockRegistry {
    async fn resolve_did(&self, did: &str) -> Result<Option<DidDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.network_down.load(Ordering::SeqCst) {
            return Err(aura_verifier::Error::NodeUnavailable("network disabled".to_string()));
        }
        Ok(self.dids.lock().unwrap().get(did).cloned())
    }

    async fn check_vc_status(&self, vc_id: &str) -> Result<VcStatusReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.network_down.load(Ordering::SeqCst) {
            return Err(aura_verifier::Error::NodeUnavailable("network disabled".to_string()));
        }
        Ok(self.statuses.lock().unwrap().get(vc_id).cloned().unwrap_or(VcStatusReport {
            exists: false,
            status: Status::Unspecified,
            revoked: false,
            expired: false,
            vc: None,
        }))
    }

    async fn get_credential(&self, vc_id: &str) -> Result<VerifiableCredential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.network_down.load(Ordering::SeqCst) {
            return Err(aura_verifier::Error::NodeUnavailable("network disabled".to_string()));
        }
        self.statuses
            .lock()
            .unwrap()
            .get(vc_id)
            .and_then(|report| report.vc.clone())
            .ok_or_else(|| aura_verifier::Error::NotFound { vc_id: vc_id.to_string() })
    }

    async fn is_credential_revoked(&self, vc_id: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.network_down.load(Ordering::SeqCst) {
            return Err(aura_verifier::Error::NodeUnavailable("network disabled".to_string()));
        }
        Ok(self.statuses.lock().unwrap().get(vc_id).is_some_and(|r| r.revoked))
    }

    async fn fetch_revocation_list(&self, _merkle_root: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.network_down.load(Ordering::SeqCst) {
            return Err(aura_verifier::Error::NodeUnavailable("network disabled".to_string()));
        }
        Ok(vec![])
    }
}

/// A signed holder identity usable across scenarios: a keypair plus the DID
/// document that publishes its public key as an authentication method.
struct Holder {
    did: String,
    signing_key: ed25519_dalek::SigningKey,
    did_document: DidDocument,
}

fn make_holder(did: &str) -> Holder {
    let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
    let method_id = format!("{did}#key-1");
    let did_document = DidDocument {
        id: did.to_string(),
        controller: None,
        verification_method: vec![VerificationMethod {
            id: method_id.clone(),
            key_type: KeyType::Ed25519,
            controller: did.to_string(),
            public_key: signing_key.verifying_key().to_bytes().to_vec(),
        }],
        authentication: vec![method_id],
        service: vec![],
    };
    Holder { did: did.to_string(), signing_key, did_document }
}

/// Build the base64 QR token for a presentation with no `sig` field set,
/// signing over the canonical hash of every other field the way the holder
/// would, then assemble and encode the final wire payload.
fn build_qr(holder: &Holder, p: &str, vcs: &[&str], ctx: &[(&str, bool)], exp: i64, n: u64) -> String {
    let ctx_map: BTreeMap<String, bool> = ctx.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    let signed_fields = json!({
        "v": "1.0",
        "p": p,
        "h": holder.did,
        "vcs": vcs,
        "ctx": ctx_map,
        "exp": exp,
        "n": n,
    });
    let message = aura_verifier::crypto::hash_object(&signed_fields).expect("signed fields are hashable");
    let signature = holder.signing_key.sign(&message);

    let mut wire = signed_fields;
    wire["sig"] = json!(hex::encode(signature.to_bytes()));
    aura_verifier::crypto::base64_encode(wire.to_string().as_bytes())
}

fn age_assertion_vc(vc_id: &str, holder_did: &str) -> VerifiableCredential {
    VerifiableCredential {
        vc_id: vc_id.to_string(),
        issuer_did: "did:aura:testnet:issuer".to_string(),
        holder_did: holder_did.to_string(),
        vc_type: VcType::AgeAssertion,
        issued_at: now() - 3600,
        expires_at: None,
        credential_subject: HashMap::from([("ageOver21".to_string(), json!(true))]),
        proof: None,
        credential_index: None,
    }
}

fn active_status(vc: VerifiableCredential) -> VcStatusReport {
    VcStatusReport { exists: true, status: Status::Active, revoked: false, expired: false, vc: Some(vc) }
}

fn fresh_cache() -> Arc<Cache> {
    Arc::new(Cache::new(Arc::new(InMemoryAdapter::new()), CacheConfigBuilder::default().build().unwrap()).unwrap())
}

/// S1 — happy path, age 21+: a valid presentation over an active VC verifies
/// online, discloses the requested attribute, and stamps a well-formed audit
/// id.
#[tokio::test]
async fn happy_path_age_21_plus_verifies_online() {
    let holder = make_holder("did:aura:testnet:holder1");
    let registry = Arc::new(
        MockRegistry::default()
            .with_did(holder.did_document.clone())
            .with_status("vc_age_21_001", active_status(age_assertion_vc("vc_age_21_001", &holder.did))),
    );
    let verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), fresh_cache(), registry);

    let qr = build_qr(&holder, "pres_1", &["vc_age_21_001"], &[("show_age_over_21", true)], now() + 300, 7);
    let result = verifier.verify(VerifyRequest { qr_code_data: qr, ..Default::default() }).await;

    assert!(result.is_valid, "expected a valid result, got {result:?}");
    assert_eq!(result.vc_details.len(), 1);
    assert_eq!(result.vc_details[0].status, Status::Active);
    assert_eq!(result.attributes.get("ageOver21"), Some(&json!(true)));
    assert_eq!(result.verification_method, aura_verifier::verifier::VerificationMethod::Online);
    assert_eq!(result.audit_id.len(), 32);
    assert!(result.audit_id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
}

/// S2 — expired: `exp` has passed beyond clock skew, so the pipeline rejects
/// before ever resolving the holder's DID or calling the registry.
#[tokio::test]
async fn expired_presentation_is_rejected_without_a_registry_call() {
    let holder = make_holder("did:aura:testnet:holder2");
    let registry = Arc::new(MockRegistry::default());
    let verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), fresh_cache(), Arc::clone(&registry));

    let qr = build_qr(&holder, "pres_2", &["vc_age_21_001"], &[("show_age_over_21", true)], now() - 3600, 1);
    let result = verifier.verify(VerifyRequest { qr_code_data: qr, ..Default::default() }).await;

    assert!(!result.is_valid);
    assert_eq!(result.verification_error_code.as_deref(), Some("QR_EXPIRED"));
    assert!(result.vc_details.is_empty());
    assert_eq!(registry.call_count(), 0);
}

/// S3 — replay: submitting the same presentation twice rejects the second
/// attempt on the nonce alone, never reaching signature verification again.
#[tokio::test]
async fn replayed_nonce_is_rejected_on_second_submission() {
    let holder = make_holder("did:aura:testnet:holder3");
    let registry = Arc::new(
        MockRegistry::default()
            .with_did(holder.did_document.clone())
            .with_status("vc_age_21_001", active_status(age_assertion_vc("vc_age_21_001", &holder.did))),
    );
    let verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), fresh_cache(), registry);

    let qr = build_qr(&holder, "pres_3", &["vc_age_21_001"], &[("show_age_over_21", true)], now() + 300, 42);
    let first = verifier.verify(VerifyRequest { qr_code_data: qr.clone(), ..Default::default() }).await;
    assert!(first.is_valid, "first submission should succeed, got {first:?}");

    let second = verifier.verify(VerifyRequest { qr_code_data: qr, ..Default::default() }).await;
    assert!(!second.is_valid);
    assert_eq!(second.verification_error_code.as_deref(), Some("QR_NONCE_ERROR"));
}

/// S4 — revoked: the registry reports the referenced VC as revoked, which
/// fails policy even though the holder's own signature is perfectly valid.
#[tokio::test]
async fn revoked_credential_fails_policy() {
    let holder = make_holder("did:aura:testnet:holder4");
    let vc = age_assertion_vc("vc_age_21_002", &holder.did);
    let report = VcStatusReport { exists: true, status: Status::Revoked, revoked: true, expired: false, vc: Some(vc) };
    let registry = Arc::new(
        MockRegistry::default().with_did(holder.did_document.clone()).with_status("vc_age_21_002", report),
    );
    let verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), fresh_cache(), registry);

    let qr = build_qr(&holder, "pres_4", &["vc_age_21_002"], &[("show_age_over_21", true)], now() + 300, 1);
    let result = verifier.verify(VerifyRequest { qr_code_data: qr, ..Default::default() }).await;

    assert!(!result.is_valid);
    assert_eq!(result.vc_details[0].status, Status::Revoked);
    assert_eq!(result.verification_error_code.as_deref(), Some("CREDENTIAL_REVOKED"));
    assert!(result.verification_error.as_deref().unwrap_or_default().contains("revoked"));
}

/// S5 — cached hit after an online warm-up: the first verification runs
/// online and populates the cache; with the network then disabled, a second,
/// distinct presentation for the same VC verifies straight from the cache
/// without ever reaching the registry, reporting `Cached` rather than
/// `Online` or `Offline` (the latter is reserved for a verifier explicitly
/// configured with `offline(true)`).
#[tokio::test]
async fn offline_verification_succeeds_after_online_warm_up() {
    let holder = make_holder("did:aura:testnet:holder5");
    let registry = Arc::new(
        MockRegistry::default()
            .with_did(holder.did_document.clone())
            .with_status("vc_age_21_003", active_status(age_assertion_vc("vc_age_21_003", &holder.did))),
    );
    let cache = fresh_cache();

    let online = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), Arc::clone(&cache), Arc::clone(&registry));
    let warm_up_qr = build_qr(&holder, "pres_5a", &["vc_age_21_003"], &[("show_age_over_21", true)], now() + 300, 1);
    let warm_up = online.verify(VerifyRequest { qr_code_data: warm_up_qr, ..Default::default() }).await;
    assert!(warm_up.is_valid, "online warm-up should succeed, got {warm_up:?}");
    assert_eq!(warm_up.verification_method, aura_verifier::verifier::VerificationMethod::Online);

    registry.disable_network();
    let cached_verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), Arc::clone(&cache), Arc::clone(&registry));
    let second_qr = build_qr(&holder, "pres_5b", &["vc_age_21_003"], &[("show_age_over_21", true)], now() + 300, 2);
    let result = cached_verifier.verify(VerifyRequest { qr_code_data: second_qr, ..Default::default() }).await;

    assert!(result.is_valid, "cached verification should succeed from cache, got {result:?}");
    assert_eq!(result.verification_method, aura_verifier::verifier::VerificationMethod::Cached);
    assert!(result.network_latency_ms < 50, "cached verification should not incur registry latency");
}

/// S6 — tampered signature: flipping a single nibble of `sig` makes the
/// holder signature fail to verify, independent of everything else being
/// otherwise well-formed.
#[tokio::test]
async fn tampered_signature_fails_verification() {
    let holder = make_holder("did:aura:testnet:holder6");
    let registry = Arc::new(
        MockRegistry::default()
            .with_did(holder.did_document.clone())
            .with_status("vc_age_21_004", active_status(age_assertion_vc("vc_age_21_004", &holder.did))),
    );
    let verifier = Verifier::new(VerifierConfigBuilder::default().build().unwrap(), fresh_cache(), registry);

    let qr = build_qr(&holder, "pres_6", &["vc_age_21_004"], &[("show_age_over_21", true)], now() + 300, 1);
    let decoded = aura_verifier::crypto::base64_decode(&qr).unwrap();
    let mut payload: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
    let mut sig = payload["sig"].as_str().unwrap().to_string();
    let flipped = if sig.starts_with('0') { '1' } else { '0' };
    sig.replace_range(0..1, &flipped.to_string());
    payload["sig"] = json!(sig);
    let tampered_qr = aura_verifier::crypto::base64_encode(payload.to_string().as_bytes());

    let result = verifier.verify(VerifyRequest { qr_code_data: tampered_qr, ..Default::default() }).await;

    assert!(!result.is_valid);
    assert!(!result.signature_valid);
    assert_eq!(result.verification_error_code.as_deref(), Some("SIGNATURE_VERIFICATION_FAILED"));
}
