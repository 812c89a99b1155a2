//! Approximate nonce backend: a fixed-capacity bloom filter.
//!
//! Trades unbounded memory growth for a bounded false-positive rate:
//! `has_been_used` may occasionally answer `true` for a key that was never
//! inserted, which in turn means `validate_nonce` may spuriously reject a
//! fresh nonce as a replay. This is the documented trade-off for verifiers
//! with nonce volume too high for the exact map.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use bitvec::prelude::{BitVec, Lsb0};

use crate::crypto::sha256;
use crate::error::NonceFailure;

use super::{now_ms, NonceConfig, NonceTracker};

/// A fixed-capacity bloom filter sized for an expected element count `m`
/// and a target false-positive rate, plus a rolling generation counter so
/// that `cleanup` can approximate time-windowed expiry by resetting the
/// whole filter once the window has fully elapsed.
pub struct BloomNonceTracker {
    config: NonceConfig,
    bits: Mutex<BitVec<usize, Lsb0>>,
    hash_count: u32,
    inserted: AtomicUsize,
    last_reset_ms: AtomicI64,
}

impl BloomNonceTracker {
    /// Build a filter sized for `expected_count` entries at `false_positive_rate`
    /// (e.g. `0.01` for 1%).
    #[must_use]
    pub fn new(config: NonceConfig, expected_count: usize, false_positive_rate: f64) -> Self {
        let (num_bits, hash_count) = optimal_params(expected_count.max(1), false_positive_rate);
        Self {
            config,
            bits: Mutex::new(BitVec::repeat(false, num_bits)),
            hash_count,
            inserted: AtomicUsize::new(0),
            last_reset_ms: AtomicI64::new(now_ms()),
        }
    }

    fn bit_indices(&self, key: &str) -> Vec<usize> {
        // Standard double-hashing trick (Kirsch-Mitzenmacher): derive
        // `hash_count` indices from two independent SHA-256-derived
        // 64-bit words instead of `hash_count` independent hash functions.
        let digest = sha256(key.as_bytes());
        let h1 = u64::from_le_bytes(digest[0..8].try_into().expect("8 bytes"));
        let h2 = u64::from_le_bytes(digest[8..16].try_into().expect("8 bytes"));
        let len = self.bits.lock().expect("bloom filter mutex poisoned").len() as u64;
        (0..self.hash_count)
            .map(|i| (h1.wrapping_add((i as u64).wrapping_mul(h2)) % len.max(1)) as usize)
            .collect()
    }

    fn reset_if_window_elapsed(&self, now: i64) {
        let last_reset = self.last_reset_ms.load(Ordering::Relaxed);
        if now - last_reset >= self.config.window_ms {
            let mut bits = self.bits.lock().expect("bloom filter mutex poisoned");
            bits.fill(false);
            drop(bits);
            self.inserted.store(0, Ordering::Relaxed);
            self.last_reset_ms.store(now, Ordering::Relaxed);
        }
    }
}

impl NonceTracker for BloomNonceTracker {
    fn validate_nonce(&self, nonce_key: &str, timestamp_ms: i64) -> Result<(), NonceFailure> {
        let now = now_ms();
        self.config.window_check(timestamp_ms, now)?;
        self.reset_if_window_elapsed(now);

        if self.has_been_used(nonce_key) {
            return Err(NonceFailure::Replay);
        }
        let indices = self.bit_indices(nonce_key);
        let mut bits = self.bits.lock().expect("bloom filter mutex poisoned");
        for idx in indices {
            bits.set(idx, true);
        }
        drop(bits);
        self.inserted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn has_been_used(&self, nonce_key: &str) -> bool {
        let indices = self.bit_indices(nonce_key);
        let bits = self.bits.lock().expect("bloom filter mutex poisoned");
        indices.into_iter().all(|idx| bits[idx])
    }

    fn cleanup(&self, now: i64) {
        self.reset_if_window_elapsed(now);
    }

    fn size(&self) -> usize {
        self.inserted.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.bits.lock().expect("bloom filter mutex poisoned").fill(false);
        self.inserted.store(0, Ordering::Relaxed);
        self.last_reset_ms.store(now_ms(), Ordering::Relaxed);
    }
}

/// Standard bloom-filter sizing formulas: `m = -n*ln(p)/(ln2)^2` bits,
/// `k = (m/n)*ln2` hash functions.
fn optimal_params(expected_count: usize, false_positive_rate: f64) -> (usize, u32) {
    let n = expected_count as f64;
    let p = false_positive_rate.clamp(1e-6, 0.5);
    let m = (-(n * p.ln()) / std::f64::consts::LN_2.powi(2)).ceil().max(64.0);
    let k = ((m / n) * std::f64::consts::LN_2).round().clamp(1.0, 16.0);
    (m as usize, k as u32)
}
