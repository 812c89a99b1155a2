//! # Event sink capability (produced)
//!
//! A single `emit` surface the verifier, cache, and synchronizer use to
//! report what happened, without taking a hard dependency on any particular
//! logging/metrics/audit backend. A [`tracing`]-backed default is provided
//! for hosts that don't supply their own sink.

use crate::cache::SyncResult;
use crate::verifier::VerificationResult;

/// The four event shapes the core ever emits. Matches the wire-level
/// `eventName` set: `verification`, `error`, `sync`, `cache_update`.
#[derive(Clone, Debug)]
pub enum Event {
    /// A verification pipeline run completed (`Valid` or `Failed`).
    Verification(Box<VerificationResult>),
    /// An error occurred outside the scope of a single verification's
    /// captured result (e.g. a background sync's outright failure).
    Error {
        /// Where the error happened, for log correlation.
        context: String,
        /// The error's display text.
        message: String,
    },
    /// A [`crate::cache::CacheSync`] pass completed.
    Sync(SyncResult),
    /// The cache wrote, evicted, or deleted an entry.
    CacheUpdate {
        /// The cache key affected.
        key: String,
        /// What happened to it.
        action: CacheAction,
    },
}

/// What a `cache_update` event reports happened to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheAction {
    /// A new or refreshed entry was written.
    Set,
    /// An entry was evicted to satisfy `maxEntries`.
    Evicted,
    /// An entry was removed by explicit `delete` or TTL expiry.
    Deleted,
    /// The whole credential namespace was cleared.
    Cleared,
}

/// Capability produced by the core: implementors receive every [`Event`] as
/// it happens. Per SPEC_FULL.md, a handler's own failure is caught and
/// logged — it never propagates back into the verification outcome.
pub trait EventSink: Send + Sync {
    /// Handle one event. Must not panic; any error a handler wants to
    /// surface should be logged internally, not returned.
    fn emit(&self, event: Event);
}

/// An [`EventSink`] that forwards every event to [`tracing`] at an
/// appropriate level and otherwise does nothing. Reasonable default for
/// hosts that only want log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        match event {
            Event::Verification(result) => {
                tracing::info!(
                    audit_id = %result.audit_id,
                    is_valid = result.is_valid,
                    holder_did = %result.holder_did,
                    "verification completed"
                );
            }
            Event::Error { context, message } => {
                tracing::warn!(%context, %message, "uncaught error");
            }
            Event::Sync(result) => {
                tracing::info!(
                    success = result.success,
                    synced_items = result.synced_items,
                    error_count = result.errors.len(),
                    duration_ms = result.duration_ms,
                    "cache sync completed"
                );
            }
            Event::CacheUpdate { key, action } => {
                tracing::debug!(%key, ?action, "cache update");
            }
        }
    }
}

/// Emit `event` to `sink`, catching and logging any panic the handler
/// raises instead of letting it unwind into the caller. Mirrors the
/// "handler exceptions are caught and dropped" propagation rule.
pub fn emit_guarded(sink: &dyn EventSink, event: Event) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.emit(event)));
    if let Err(panic) = outcome {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!(%message, "event sink handler panicked; dropping");
    }
}
