//! Exact nonce backend: a concurrent map from nonce key to expiry.

use dashmap::DashMap;

use crate::error::NonceFailure;

use super::{now_ms, NonceConfig, NonceTracker};

/// Exact, unbounded-false-positive nonce tracker backed by a concurrent
/// hash map. The default backend.
pub struct ExactNonceTracker {
    config: NonceConfig,
    entries: DashMap<String, i64>,
}

impl ExactNonceTracker {
    /// Build an empty tracker with the given window/skew configuration.
    #[must_use]
    pub fn new(config: NonceConfig) -> Self {
        Self { config, entries: DashMap::new() }
    }
}

impl NonceTracker for ExactNonceTracker {
    fn validate_nonce(&self, nonce_key: &str, timestamp_ms: i64) -> Result<(), NonceFailure> {
        let now = now_ms();
        self.config.window_check(timestamp_ms, now)?;

        // `entry` takes the shard lock for the key, making the
        // check-then-insert atomic with respect to concurrent callers for
        // the same key.
        match self.entries.entry(nonce_key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    return Err(NonceFailure::Replay);
                }
                occupied.insert(timestamp_ms + self.config.window_ms);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(timestamp_ms + self.config.window_ms);
                Ok(())
            }
        }
    }

    fn has_been_used(&self, nonce_key: &str) -> bool {
        self.entries.get(nonce_key).is_some_and(|expires_at| *expires_at > now_ms())
    }

    fn cleanup(&self, now_ms: i64) {
        self.entries.retain(|_, expires_at| *expires_at > now_ms);
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
