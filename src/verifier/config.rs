//! Orchestrator configuration: clock skew, nonce window, timeouts, and the
//! default policy knobs a verifier call can override per-request.

use derive_builder::Builder;

use crate::error::{Error, Result};

/// Construction-time configuration for a [`super::Verifier`]. All fields
/// have spec-mandated defaults; construct with [`VerifierConfigBuilder`].
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", setter(into), build_fn(error = "Error", validate = "Self::validate"))]
pub struct VerifierConfig {
    /// Protocol versions this verifier accepts in `v`.
    #[builder(default = "vec![\"1.0\".to_string()]")]
    pub supported_versions: Vec<String>,
    /// Seconds of slack applied to `exp` bounds (`now - clockSkew` and `now
    /// + clockSkew` for freshness purposes, distinct from the strict-mode
    /// one-year/ten-year absolute bounds which are never relaxed).
    #[builder(default = "30")]
    pub clock_skew_secs: i64,
    /// How long an accepted nonce stays live, in seconds.
    #[builder(default = "300")]
    pub nonce_window_secs: i64,
    /// How often the nonce tracker's background cleanup runs, in
    /// milliseconds.
    #[builder(default = "300_000")]
    pub cleanup_interval_ms: i64,
    /// Per-verification deadline. Registry calls in flight past this are
    /// treated as [`Error::Timeout`].
    #[builder(default = "std::time::Duration::from_secs(30)")]
    pub timeout: std::time::Duration,
    /// When set, no registry calls are made at all; every VC status
    /// question is answered from the cache alone, and a cache miss is
    /// [`Error::OfflineModeUnavailable`] rather than a fallthrough.
    #[builder(default = "false")]
    pub offline: bool,
}

impl VerifierConfigBuilder {
    fn validate(&self) -> Result<()> {
        if let Some(versions) = &self.supported_versions {
            if versions.is_empty() {
                return Err(Error::configuration("supportedVersions", "must not be empty"));
            }
        }
        if let Some(window) = self.nonce_window_secs {
            if window <= 0 {
                return Err(Error::configuration("nonceWindowSecs", "must be positive"));
            }
        }
        Ok(())
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfigBuilder::default().build().expect("defaults always build")
    }
}

/// Per-call policy overrides, passed alongside the QR payload to
/// [`super::Verifier::verify`].
#[derive(Clone, Debug, Default)]
pub struct VerifyRequest {
    /// The raw QR/wire payload (`aura://verify?data=...` or a bare token).
    pub qr_code_data: String,
    /// The verifying party's own address/id, for audit correlation only —
    /// not cryptographically checked against anything in this spec.
    pub verifier_address: Option<String>,
    /// VC types that must all be present among the presented credentials
    /// for the outcome to be valid.
    pub required_vc_types: Vec<crate::vc::VcType>,
    /// Reject any referenced credential whose `issuedAt` is older than
    /// `now - maxCredentialAge` seconds.
    pub max_credential_age_secs: Option<i64>,
}
