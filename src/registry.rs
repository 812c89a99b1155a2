//! # Registry capability (consumed)
//!
//! The narrow async interface the verifier needs from an on-chain identity
//! registry. Transport, retries, and batching live entirely on the
//! implementation side — per SPEC_FULL.md open question 2, the orchestrator
//! calls each method at most once per need and never retries on its own.

use std::collections::HashMap;
use std::future::Future;

use crate::error::Result;
use crate::vc::{DidDocument, Status, VerifiableCredential};

/// The outcome of a single VC status check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VcStatusReport {
    /// Whether the registry has any record of this id at all.
    pub exists: bool,
    /// The credential's lifecycle status.
    pub status: Status,
    /// Whether the credential is revoked (redundant with `status` in the
    /// common case, but kept distinct since a registry MAY report
    /// revocation out of band from its status enum).
    pub revoked: bool,
    /// Whether the credential's validity period has lapsed.
    pub expired: bool,
    /// The full credential record, if the registry chooses to return it
    /// inline with the status check.
    pub vc: Option<VerifiableCredential>,
}

/// Capability consumed by [`crate::verifier`] and [`crate::cache::CacheSync`]
/// to resolve DIDs and credential status against the on-chain registry.
///
/// Implemented with async-fn-in-trait rather than `#[async_trait]`: every
/// method here is called from a single call site per verification, so the
/// extra boxing the macro would add buys nothing.
pub trait RegistryClient: Send + Sync {
    /// Resolve a DID to its document, or `Ok(None)` if the registry has no
    /// record of it. Transport/API failures are `Err`.
    fn resolve_did(&self, did: &str) -> impl Future<Output = Result<Option<DidDocument>>> + Send;

    /// Check a single credential's current status.
    fn check_vc_status(&self, vc_id: &str) -> impl Future<Output = Result<VcStatusReport>> + Send;

    /// Optional fast path for checking many credentials in one round trip.
    /// The default implementation falls back to sequential
    /// [`RegistryClient::check_vc_status`] calls.
    fn batch_check_vc_status(
        &self, vc_ids: &[String],
    ) -> impl Future<Output = Result<HashMap<String, VcStatusReport>>> + Send {
        async move {
            let mut out = HashMap::with_capacity(vc_ids.len());
            for vc_id in vc_ids {
                out.insert(vc_id.clone(), self.check_vc_status(vc_id).await?);
            }
            Ok(out)
        }
    }

    /// Fetch the full credential record by id.
    fn get_credential(&self, vc_id: &str) -> impl Future<Output = Result<VerifiableCredential>> + Send;

    /// Whether a credential is revoked. Most callers use
    /// [`RegistryClient::check_vc_status`] instead; this is for call sites
    /// that only care about revocation.
    fn is_credential_revoked(&self, vc_id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Fetch the revocation bitmap anchored at `merkle_root`.
    fn fetch_revocation_list(&self, merkle_root: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
