//! # Error Kinds
//!
//! A single tagged error type covers every failure surface described by the
//! verifier: QR/presentation parsing and validation, cryptographic
//! primitives, the registry capability, credential status, DID resolution,
//! the offline cache, and configuration. Each variant carries a stable,
//! machine-readable [`Error::code`] alongside its human-readable [`Display`]
//! text, mirroring the `{error, error_description}` shape the reference
//! codebase uses for its own OpenID error responses.
//!
//! Per-verification errors (everything reachable from [`crate::verifier`])
//! are captured into a [`crate::verifier::VerificationResult`] rather than
//! propagated — only configuration and construction failures are meant to be
//! handled with `?`.

use thiserror::Error;

/// Why a nonce was rejected by the [`crate::nonce`] tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonceFailure {
    /// The presentation timestamp fell outside the acceptance window.
    Window,
    /// The `(holder, nonce)` pair has already been accepted.
    Replay,
}

impl std::fmt::Display for NonceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Window => write!(f, "timestamp outside the acceptance window"),
            Self::Replay => write!(f, "nonce already used"),
        }
    }
}

/// Root error type for the verifier core.
#[derive(Debug, Error)]
pub enum Error {
    /// The wire payload could not be decoded (bad base64, bad JSON, wrong
    /// shape, missing required fields).
    #[error("presentation could not be parsed: {0}")]
    Parse(String),

    /// The payload decoded but failed schema or strict-mode validation.
    #[error("presentation failed validation: {0}")]
    Validation(String),

    /// `exp` has passed (or is outside the accepted range).
    #[error("presentation expired at {expiration_time}, now {current_time}")]
    Expired {
        /// The presentation's `exp` field, Unix seconds.
        expiration_time: i64,
        /// The time the check was made, Unix seconds.
        current_time: i64,
        /// `current_time - expiration_time`.
        time_since_expiration: i64,
    },

    /// The nonce was rejected — replayed, or outside the window.
    #[error("nonce rejected: {0}")]
    Nonce(NonceFailure),

    /// Holder or issuer signature did not verify.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// A public key was malformed or the wrong length for its algorithm.
    #[error("invalid public key: {0}")]
    PublicKey(String),

    /// A hex or base64 payload was malformed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// AEAD authentication failed. Deliberately opaque — no further detail is
    /// returned to avoid a decryption oracle.
    #[error("decryption failed")]
    DecryptionFailed,

    /// A registry call did not complete before the verification deadline.
    #[error("registry call timed out")]
    Timeout,

    /// The registry could not be reached.
    #[error("registry node unavailable: {0}")]
    NodeUnavailable(String),

    /// The registry returned an application-level error.
    #[error("registry API error (status {status_code})")]
    Api {
        /// The transport-level status code reported by the registry client.
        status_code: u16,
    },

    /// The registry client gave up retrying (its own policy, not ours — see
    /// SPEC_FULL.md open question 2).
    #[error("retries exhausted contacting registry")]
    RetryExhausted,

    /// The credential has been revoked.
    #[error("credential {vc_id} is revoked")]
    Revoked {
        /// The affected credential's id.
        vc_id: String,
    },

    /// The credential has expired.
    #[error("credential {vc_id} has expired")]
    CredentialExpired {
        /// The affected credential's id.
        vc_id: String,
    },

    /// The credential is unknown to the registry.
    #[error("credential {vc_id} not found")]
    NotFound {
        /// The affected credential's id.
        vc_id: String,
    },

    /// The credential is suspended.
    #[error("credential {vc_id} is suspended")]
    Suspended {
        /// The affected credential's id.
        vc_id: String,
    },

    /// The credential issuance is still pending.
    #[error("credential {vc_id} is pending")]
    Pending {
        /// The affected credential's id.
        vc_id: String,
    },

    /// DID resolution failed for a reason other than "not found".
    #[error("DID resolution failed for {did}: {reason}")]
    DidResolution {
        /// The DID that failed to resolve.
        did: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The DID string did not match `did:aura:<network>:<id>`.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// The DID is well-formed but the registry has no document for it.
    #[error("DID not found: {0}")]
    DidNotFound(String),

    /// The cache's storage adapter failed to read an entry.
    #[error("cache read failed: {0}")]
    CacheReadFailed(String),

    /// The cache's storage adapter failed to write an entry.
    #[error("cache write failed: {0}")]
    CacheWriteFailed(String),

    /// A background or manual sync pass failed outright (individual per-item
    /// failures are reported in `SyncResult::errors` instead).
    #[error("sync failed: {0}")]
    Sync(String),

    /// Offline mode was requested but the cache had nothing to offer.
    #[error("offline mode: no cached answer available")]
    OfflineModeUnavailable,

    /// A configuration value was invalid at construction time.
    #[error("configuration error in field `{field}`: {reason}")]
    Configuration {
        /// The offending field's name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl Error {
    /// The stable, machine-readable identity of this error, suitable for
    /// `VerificationResult::verification_error_code`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "QR_PARSE_ERROR",
            Self::Validation(_) => "QR_VALIDATION_ERROR",
            Self::Expired { .. } => "QR_EXPIRED",
            Self::Nonce(_) => "QR_NONCE_ERROR",
            Self::Signature(_) => "SIGNATURE_VERIFICATION_FAILED",
            Self::PublicKey(_) => "PUBLIC_KEY_ERROR",
            Self::Encoding(_) => "ENCODING_ERROR",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::NodeUnavailable(_) => "NODE_UNAVAILABLE",
            Self::Api { .. } => "API_ERROR",
            Self::RetryExhausted => "RETRY_EXHAUSTED",
            Self::Revoked { .. } => "CREDENTIAL_REVOKED",
            Self::CredentialExpired { .. } => "CREDENTIAL_EXPIRED",
            Self::NotFound { .. } => "CREDENTIAL_NOT_FOUND",
            Self::Suspended { .. } => "CREDENTIAL_SUSPENDED",
            Self::Pending { .. } => "CREDENTIAL_PENDING",
            Self::DidResolution { .. } => "DID_RESOLUTION_ERROR",
            Self::InvalidDid(_) => "INVALID_DID",
            Self::DidNotFound(_) => "DID_NOT_FOUND",
            Self::CacheReadFailed(_) => "CACHE_READ_FAILED",
            Self::CacheWriteFailed(_) => "CACHE_WRITE_FAILED",
            Self::Sync(_) => "SYNC_ERROR",
            Self::OfflineModeUnavailable => "OFFLINE_MODE_UNAVAILABLE",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// For `Expired`, whether `time_since_expiration` falls within `n`
    /// seconds of tolerance.
    #[must_use]
    pub const fn within_tolerance(&self, n: i64) -> bool {
        match self {
            Self::Expired { time_since_expiration, .. } => time_since_expiration.abs() <= n,
            _ => false,
        }
    }

    pub(crate) fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration { field: field.into(), reason: reason.into() }
    }
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
