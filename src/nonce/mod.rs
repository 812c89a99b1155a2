//! # Replay-resistant nonce tracker
//!
//! A bounded, time-windowed at-most-once set over `(holderDid, nonce)`
//! pairs. Two backends share one [`NonceTracker`] contract: an exact
//! [`ExactNonceTracker`] (default) and, behind the `bloom` feature, an
//! approximate [`bloom::BloomNonceTracker`] for high-volume verifiers that
//! can tolerate a bounded false-positive rate on replay rejection.

mod exact;

#[cfg(feature = "bloom")]
mod bloom;

pub use exact::ExactNonceTracker;

#[cfg(feature = "bloom")]
pub use bloom::BloomNonceTracker;

use crate::error::NonceFailure;

/// The at-most-once contract every nonce backend implements.
pub trait NonceTracker: Send + Sync {
    /// Accept or reject `nonce_key` observed at `timestamp_ms`.
    ///
    /// - Rejects with [`NonceFailure::Window`] if `timestamp_ms` falls
    ///   outside `[now - window, now + clockSkew]`.
    /// - Rejects with [`NonceFailure::Replay`] if the key is already present
    ///   with an unexpired entry.
    /// - Otherwise inserts `{ nonce_key, expires_at = timestamp_ms + window }`
    ///   and accepts.
    fn validate_nonce(&self, nonce_key: &str, timestamp_ms: i64) -> Result<(), NonceFailure>;

    /// Whether `nonce_key` has been recorded. Exact backends never false
    /// positive; the bloom backend may.
    fn has_been_used(&self, nonce_key: &str) -> bool;

    /// Remove every entry with `expires_at <= now_ms`.
    fn cleanup(&self, now_ms: i64);

    /// Current number of live entries (approximate for the bloom backend).
    fn size(&self) -> usize;

    /// Drop every entry.
    fn clear(&self);
}

/// Shared window/skew parameters used by both backends.
#[derive(Clone, Copy, Debug)]
pub struct NonceConfig {
    /// How long an accepted nonce stays live, in milliseconds.
    pub window_ms: i64,
    /// How far into the future a timestamp may be and still be accepted, in
    /// milliseconds.
    pub clock_skew_ms: i64,
    /// How often the background cleanup task runs, in milliseconds.
    pub cleanup_interval_ms: i64,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self { window_ms: 5 * 60 * 1000, clock_skew_ms: 30 * 1000, cleanup_interval_ms: 5 * 60 * 1000 }
    }
}

impl NonceConfig {
    pub(crate) fn window_check(&self, timestamp_ms: i64, now_ms: i64) -> Result<(), NonceFailure> {
        if timestamp_ms < now_ms - self.window_ms || timestamp_ms > now_ms + self.clock_skew_ms {
            return Err(NonceFailure::Window);
        }
        Ok(())
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as i64)
}
