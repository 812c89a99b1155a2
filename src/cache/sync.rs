//! Background/manual synchronizer: reconciles the offline cache against a
//! [`crate::registry::RegistryClient`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::Cache;
use crate::error::Result;
use crate::events::{emit_guarded, Event, EventSink};
use crate::registry::RegistryClient;
use crate::vc::Status;

/// The outcome of one [`CacheSync::sync`] pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncResult {
    /// Whether the pass completed without an outright failure (per-item
    /// errors do not flip this to `false` — see `errors`).
    pub success: bool,
    /// Number of cached credentials successfully refreshed.
    pub synced_items: usize,
    /// Per-item failures, as `(vc_id, message)`. A sync failure is
    /// diagnostic, not poisoning: the cache keeps whatever it had before.
    pub errors: Vec<(String, String)>,
    /// Wall-clock duration of the pass, in milliseconds.
    pub duration_ms: u64,
}

/// A hint from the host about current network conditions, consulted by
/// [`CacheSync::start_auto_sync`] when `wifi_only` is set.
pub trait NetworkHint: Send + Sync {
    /// Whether the host currently believes it is on a wifi (or otherwise
    /// "free"/unmetered) connection.
    fn is_wifi(&self) -> bool;
}

/// Always reports wifi — the default when the host has no opinion.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysWifi;

impl NetworkHint for AlwaysWifi {
    fn is_wifi(&self) -> bool {
        true
    }
}

/// Options for [`CacheSync::start_auto_sync`].
#[derive(Clone, Debug, Default)]
pub struct AutoSyncOptions {
    /// Run one `sync()` immediately instead of waiting for the first tick.
    pub sync_on_startup: bool,
    /// Skip a tick when the [`NetworkHint`] reports a non-wifi connection.
    pub wifi_only: bool,
}

/// Owns a cache and a registry client and periodically reconciles the
/// former against the latter.
pub struct CacheSync<R: RegistryClient> {
    cache: Arc<Cache>,
    registry: Arc<R>,
    sink: Option<Arc<dyn EventSink>>,
    network_hint: Arc<dyn NetworkHint>,
    handle: std::sync::Mutex<Option<(JoinHandle<()>, Arc<Notify>)>>,
}

impl<R: RegistryClient + 'static> CacheSync<R> {
    /// Build a synchronizer over `cache` and `registry`.
    pub fn new(cache: Arc<Cache>, registry: Arc<R>) -> Self {
        Self { cache, registry, sink: None, network_hint: Arc::new(AlwaysWifi), handle: std::sync::Mutex::new(None) }
    }

    /// Attach an [`EventSink`] so completed passes emit `sync` events.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach a [`NetworkHint`] consulted by `wifi_only` auto-sync ticks.
    #[must_use]
    pub fn with_network_hint(mut self, hint: Arc<dyn NetworkHint>) -> Self {
        self.network_hint = hint;
        self
    }

    /// Run one synchronization pass: re-resolve every cached credential's
    /// status, refresh its revocation bitmap if the merkle root changed,
    /// and record the sync time. Never poisons the cache — a failure for
    /// one credential is recorded in `errors` and the rest proceed.
    pub async fn sync(&self) -> Result<SyncResult> {
        let started = std::time::Instant::now();
        let now = now_secs();
        let vc_ids = self.cache.cached_vc_ids()?;

        let mut synced_items = 0;
        let mut errors = Vec::new();
        for vc_id in vc_ids {
            match self.sync_one(&vc_id, now).await {
                Ok(()) => synced_items += 1,
                Err(e) => errors.push((vc_id, e.to_string())),
            }
        }
        self.cache.set_last_sync_time(now)?;

        let result = SyncResult {
            success: true,
            synced_items,
            errors,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        if let Some(sink) = &self.sink {
            emit_guarded(sink.as_ref(), Event::Sync(result.clone()));
        }
        Ok(result)
    }

    async fn sync_one(&self, vc_id: &str, now: i64) -> Result<()> {
        let Some(mut entry) = self.cache.get(vc_id, now)? else { return Ok(()) };
        let report = self.registry.check_vc_status(vc_id).await?;

        entry.revocation_status.is_revoked = report.revoked;
        entry.revocation_status.checked_at = now;
        if report.status == Status::Revoked {
            entry.revocation_status.is_revoked = true;
        }

        if let Some(merkle_root) = &entry.revocation_status.merkle_root {
            let known = self.cache.get_revocation_list(merkle_root)?;
            if known.is_none() {
                let bitmap = self.registry.fetch_revocation_list(merkle_root).await?;
                self.cache.set_revocation_list(merkle_root, bitmap, now)?;
            }
        }

        self.cache.set(vc_id, entry, now)
    }

    /// Spawn a background task that calls [`Self::sync`] every
    /// `interval_ms`. Returns immediately; call [`Self::stop_auto_sync`] to
    /// cancel. Replaces any previously running auto-sync task.
    pub fn start_auto_sync(self: &Arc<Self>, interval_ms: u64, options: AutoSyncOptions)
    where
        R: 'static,
    {
        self.stop_auto_sync();
        let stop = Arc::new(Notify::new());
        let this = Arc::clone(self);
        let stop_for_task = Arc::clone(&stop);
        let handle = tokio::spawn(async move {
            if options.sync_on_startup && (!options.wifi_only || this.network_hint.is_wifi()) {
                let _ = this.sync().await;
            }
            loop {
                tokio::select! {
                    () = stop_for_task.notified() => break,
                    () = tokio::time::sleep(Duration::from_millis(interval_ms)) => {
                        if options.wifi_only && !this.network_hint.is_wifi() {
                            continue;
                        }
                        let _ = this.sync().await;
                    }
                }
            }
        });
        *self.handle.lock().expect("auto-sync handle lock poisoned") = Some((handle, stop));
    }

    /// Cancel the background auto-sync task, if one is running.
    pub fn stop_auto_sync(&self) {
        if let Some((handle, stop)) = self.handle.lock().expect("auto-sync handle lock poisoned").take() {
            stop.notify_one();
            handle.abort();
        }
    }
}

impl<R: RegistryClient> Drop for CacheSync<R> {
    fn drop(&mut self) {
        if let Some((handle, _)) = self.handle.lock().expect("auto-sync handle lock poisoned").take() {
            handle.abort();
        }
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::cache::{CacheConfigBuilder, CachedCredential, InMemoryAdapter};
    use crate::registry::VcStatusReport;
    use crate::vc::{DidDocument, VcType, VerifiableCredential};

    struct MockRegistry {
        statuses: Mutex<HashMap<String, VcStatusReport>>,
    }

    impl RegistryClient for MockRegistry {
        async fn resolve_did(&self, _did: &str) -> Result<Option<DidDocument>> {
            Ok(None)
        }

        async fn check_vc_status(&self, vc_id: &str) -> Result<VcStatusReport> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .get(vc_id)
                .cloned()
                .unwrap_or(VcStatusReport { exists: false, status: Status::Unspecified, revoked: false, expired: false, vc: None }))
        }

        async fn get_credential(&self, _vc_id: &str) -> Result<VerifiableCredential> {
            unreachable!("not exercised by sync tests")
        }

        async fn is_credential_revoked(&self, vc_id: &str) -> Result<bool> {
            Ok(self.check_vc_status(vc_id).await?.revoked)
        }

        async fn fetch_revocation_list(&self, _merkle_root: &str) -> Result<Vec<u8>> {
            Ok(vec![0])
        }
    }

    fn credential(vc_id: &str) -> VerifiableCredential {
        VerifiableCredential {
            vc_id: vc_id.to_string(),
            issuer_did: "did:aura:testnet:issuer".to_string(),
            holder_did: "did:aura:testnet:holder".to_string(),
            vc_type: VcType::AgeAssertion,
            issued_at: 1_000,
            expires_at: None,
            credential_subject: HashMap::new(),
            proof: None,
            credential_index: None,
        }
    }

    #[tokio::test]
    async fn sync_refreshes_status_for_each_cached_credential() {
        let cache = Arc::new(Cache::new(Arc::new(InMemoryAdapter::new()), CacheConfigBuilder::default().build().unwrap()).unwrap());
        let seeded_at = now_secs();
        cache.set("vc_1", CachedCredential::new(credential("vc_1"), seeded_at, 999_999_999), seeded_at).unwrap();

        let mut statuses = HashMap::new();
        statuses.insert(
            "vc_1".to_string(),
            VcStatusReport { exists: true, status: Status::Revoked, revoked: true, expired: false, vc: None },
        );
        let registry = Arc::new(MockRegistry { statuses: Mutex::new(statuses) });
        let sync = CacheSync::new(Arc::clone(&cache), registry);

        let result = sync.sync().await.unwrap();
        assert!(result.success);
        assert_eq!(result.synced_items, 1);
        assert!(result.errors.is_empty());

        let now = now_secs();
        let entry = cache.get("vc_1", now).unwrap().unwrap();
        assert!(entry.revocation_status.is_revoked);
    }

    #[tokio::test]
    async fn sync_records_last_sync_time() {
        let cache = Arc::new(Cache::new(Arc::new(InMemoryAdapter::new()), CacheConfigBuilder::default().build().unwrap()).unwrap());
        let registry = Arc::new(MockRegistry { statuses: Mutex::new(HashMap::new()) });
        let sync = CacheSync::new(cache, registry);
        sync.sync().await.unwrap();
    }
}
