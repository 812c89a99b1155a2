//! Value types stored in the offline cache: credentials, their revocation
//! status, and the bookkeeping metadata that drives TTL/eviction.

use serde::{Deserialize, Serialize};

use crate::vc::VerifiableCredential;

/// The coarse outcome of a verification that touched this entry, kept only
/// for the `lastVerification` summary — the full `VerificationResult` lives
/// with the caller, not the cache.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The verification that last touched this credential was valid.
    Valid,
    /// The verification that last touched this credential failed.
    Invalid,
}

/// What the cache currently believes about a credential's revocation state.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RevocationStatus {
    /// Whether the credential is currently revoked, per the last check.
    pub is_revoked: bool,
    /// When this flag was last refreshed, Unix seconds.
    pub checked_at: i64,
    /// The merkle root anchoring the issuer's revocation bitmap, if known.
    pub merkle_root: Option<String>,
}

/// Bookkeeping the cache uses to decide liveness and eviction order.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CacheMetadata {
    /// When this entry was written, Unix seconds.
    pub cached_at: i64,
    /// When this entry should be considered stale and evicted on read,
    /// Unix seconds. Always `>= cached_at`.
    pub expires_at: i64,
    /// The credential's own `issuedAt`, if known.
    pub issued_at: Option<i64>,
    /// The credential's own `expiresAt`, if known.
    pub credential_expires_at: Option<i64>,
}

/// A snapshot of the last verification that touched this credential, kept
/// for diagnostics.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LastVerification {
    /// When the verification ran, Unix seconds.
    pub timestamp: i64,
    /// Whether that verification found the credential's own checks to pass.
    pub outcome: VerificationOutcome,
}

/// A credential entry as held in the offline cache.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CachedCredential {
    /// The credential's id.
    pub vc_id: String,
    /// The full resolved credential.
    pub credential: VerifiableCredential,
    /// The credential's subject DID, duplicated from `credential` for
    /// cheap lookups.
    pub holder_did: String,
    /// The credential's issuer DID, duplicated from `credential`.
    pub issuer_did: String,
    /// Revocation state as last observed.
    pub revocation_status: RevocationStatus,
    /// TTL/eviction bookkeeping.
    pub metadata: CacheMetadata,
    /// The outcome of the last verification involving this credential, if
    /// any.
    pub last_verification: Option<LastVerification>,
}

impl CachedCredential {
    /// Build a fresh entry for `credential`, defaulting `cached_at` to `now`
    /// and `expires_at` to `now + max_age_secs` unless the caller already
    /// knows better bounds.
    #[must_use]
    pub fn new(credential: VerifiableCredential, now: i64, max_age_secs: i64) -> Self {
        Self {
            vc_id: credential.vc_id.clone(),
            holder_did: credential.holder_did.clone(),
            issuer_did: credential.issuer_did.clone(),
            metadata: CacheMetadata {
                cached_at: now,
                expires_at: now + max_age_secs,
                issued_at: Some(credential.issued_at),
                credential_expires_at: credential.expires_at,
            },
            revocation_status: RevocationStatus { is_revoked: false, checked_at: now, merkle_root: None },
            last_verification: None,
            credential,
        }
    }

    /// Whether this entry is still live: `now < metadata.expires_at`.
    #[must_use]
    pub const fn is_alive(&self, now: i64) -> bool {
        now < self.metadata.expires_at
    }
}

/// A stored, compact revocation bitmap anchored at a merkle root.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RevocationList {
    /// The merkle root this bitmap is anchored against.
    pub merkle_root: String,
    /// The bitmap itself, one bit per credential index within the issuer's
    /// namespace. Stored as bytes (MSB-first within each byte) rather than
    /// `bitvec::BitVec` so it serializes identically across adapters.
    pub bitmap: Vec<u8>,
    /// When this bitmap was last refreshed, Unix seconds.
    pub updated_at: i64,
}

impl RevocationList {
    /// Whether credential index `index` is marked revoked in this bitmap.
    /// Out-of-range indices are treated as not revoked.
    #[must_use]
    pub fn is_revoked(&self, index: u64) -> bool {
        let byte_index = (index / 8) as usize;
        let Some(byte) = self.bitmap.get(byte_index) else { return false };
        let bit_offset = 7 - (index % 8) as u8;
        (byte >> bit_offset) & 1 == 1
    }
}

/// Aggregate statistics reported by [`super::Cache::stats`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of credential entries currently stored (live or not yet
    /// swept).
    pub total_entries: usize,
    /// Entries whose TTL has lapsed but have not yet been swept.
    pub expired_entries: usize,
    /// Entries whose last known status is revoked.
    pub revoked_entries: usize,
    /// Cache hits since construction (or since `clear`).
    pub hits: u64,
    /// Cache misses since construction (or since `clear`).
    pub misses: u64,
    /// Unix seconds of the last successful sync, if any has run.
    pub last_sync_time: Option<i64>,
    /// A label identifying the storage backend in use (`"memory"`,
    /// `"file"`, `"host-local"`).
    pub storage_backend: String,
    /// Approximate size of the stored payload, in bytes.
    pub size_bytes: u64,
}

impl CacheStats {
    /// `hits / (hits + misses)`, or `None` if neither has ever happened.
    #[must_use]
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}
