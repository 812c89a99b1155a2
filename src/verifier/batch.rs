//! Concurrent verification of many independent presentations.

use std::sync::Arc;

use tokio::task::JoinSet;

use super::config::VerifyRequest;
use super::pipeline::Verifier;
use super::result::VerificationResult;
use crate::registry::RegistryClient;

/// How many [`Verifier::verify`] calls may be in flight at once within a
/// single [`verify_batch`] call.
const MAX_CONCURRENT: usize = 16;

/// Verify every request in `requests` concurrently (bounded by
/// [`MAX_CONCURRENT`]), preserving input order in the returned `Vec`. Each
/// request's outcome is independent — one presentation failing never drops
/// or poisons another's result.
pub async fn verify_batch<R: RegistryClient + 'static>(
    verifier: Arc<Verifier<R>>, requests: Vec<VerifyRequest>,
) -> Vec<VerificationResult> {
    let mut results: Vec<Option<VerificationResult>> = (0..requests.len()).map(|_| None).collect();
    let mut pending = requests.into_iter().enumerate();
    let mut in_flight = JoinSet::new();

    for (index, request) in pending.by_ref().take(MAX_CONCURRENT) {
        let verifier = Arc::clone(&verifier);
        in_flight.spawn(async move { (index, verifier.verify(request).await) });
    }

    while let Some(joined) = in_flight.join_next().await {
        let (index, result) = joined.expect("verify task panicked");
        results[index] = Some(result);
        if let Some((index, request)) = pending.next() {
            let verifier = Arc::clone(&verifier);
            in_flight.spawn(async move { (index, verifier.verify(request).await) });
        }
    }

    results.into_iter().map(|r| r.expect("every index is filled exactly once")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, CacheConfigBuilder, InMemoryAdapter};
    use crate::verifier::config::VerifierConfig;
    use crate::vc::{DidDocument, VerifiableCredential};

    struct EmptyRegistry;
    impl RegistryClient for EmptyRegistry {
        async fn resolve_did(&self, _did: &str) -> crate::error::Result<Option<DidDocument>> {
            Ok(None)
        }
        async fn check_vc_status(&self, _vc_id: &str) -> crate::error::Result<crate::registry::VcStatusReport> {
            unreachable!("not exercised: presentations fail before reaching VC status checks")
        }
        async fn get_credential(&self, _vc_id: &str) -> crate::error::Result<VerifiableCredential> {
            unreachable!("not exercised")
        }
        async fn is_credential_revoked(&self, _vc_id: &str) -> crate::error::Result<bool> {
            Ok(false)
        }
        async fn fetch_revocation_list(&self, _merkle_root: &str) -> crate::error::Result<Vec<u8>> {
            Ok(vec![])
        }
    }

    fn verifier() -> Arc<Verifier<EmptyRegistry>> {
        let cache = Arc::new(Cache::new(Arc::new(InMemoryAdapter::new()), CacheConfigBuilder::default().build().unwrap()).unwrap());
        Arc::new(Verifier::new(VerifierConfig::default(), cache, Arc::new(EmptyRegistry)))
    }

    #[tokio::test]
    async fn batch_preserves_order_and_handles_every_request() {
        let verifier = verifier();
        let requests = vec![
            VerifyRequest { qr_code_data: "garbage-1".to_string(), ..Default::default() },
            VerifyRequest { qr_code_data: "garbage-2".to_string(), ..Default::default() },
            VerifyRequest { qr_code_data: String::new(), ..Default::default() },
        ];
        let results = verify_batch(verifier, requests).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.is_valid));
    }

    #[tokio::test]
    async fn empty_batch_returns_empty() {
        let verifier = verifier();
        let results = verify_batch(verifier, vec![]).await;
        assert!(results.is_empty());
    }
}
