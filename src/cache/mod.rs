//! # Offline credential cache
//!
//! A size-bounded, TTL-indexed store of verified credentials and
//! revocation bitmaps, with LRU-ish eviction, hit/miss statistics,
//! import/export, and — in [`sync`] — a synchronizer that reconciles the
//! cache against a [`crate::registry::RegistryClient`].
//!
//! Encryption (AES-256-GCM, behind the `encryption` feature) is applied
//! uniformly to every namespace when `encryption_key` is set: the adapter
//! never sees plaintext JSON, only the `{iv, ct, tag}` envelope.

mod entry;
mod storage;
mod sync;

pub use entry::{
    CacheMetadata, CacheStats, CachedCredential, LastVerification, RevocationList, RevocationStatus,
    VerificationOutcome,
};
pub use storage::{FileAdapter, HostLocalAdapter, HostLocalStore, InMemoryAdapter, StorageAdapter};
pub use sync::{CacheSync, SyncResult};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use derive_builder::Builder;

use crate::crypto;
use crate::error::{Error, Result};
use crate::events::{emit_guarded, CacheAction, Event, EventSink};

const CREDENTIAL_PREFIX: &str = "credential:";
const REVOCATION_PREFIX: &str = "revocation:";
const DID_PREFIX: &str = "diddoc:";
const LAST_SYNC_KEY: &str = "meta:lastSyncTime";

/// Configuration for a [`Cache`]. Construct with [`CacheConfigBuilder`]
/// (all fields optional; defaults match spec §4.4).
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned", setter(into, strip_option), build_fn(error = "Error"))]
pub struct CacheConfig {
    /// Default TTL applied to a credential when the caller does not preset
    /// `expiresAt`, in seconds.
    #[builder(default = "3600")]
    pub max_age_secs: i64,
    /// Hard cap on the number of credential entries. Overflow evicts the
    /// oldest-by-`cachedAt` entry.
    #[builder(default = "1000")]
    pub max_entries: usize,
    /// Whether to use a non-memory storage adapter. When `false`, `Cache`
    /// is constructed with an [`InMemoryAdapter`] regardless of what the
    /// caller passes to [`Cache::new`].
    #[builder(default = "true")]
    pub persist_to_disk: bool,
    /// 32-byte AES-256-GCM key, hex-encoded. When present, every entry is
    /// encrypted at rest. Construction fails if the hex is malformed or
    /// not exactly 32 bytes.
    #[builder(default)]
    pub encryption_key: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfigBuilder::default().build().expect("defaults always build")
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Error::configuration(e.field_name(), "required field not set")
    }
}

#[cfg(feature = "encryption")]
fn resolve_encryption_key(hex_key: &str) -> Result<[u8; 32]> {
    let bytes = crypto::from_hex(hex_key)?;
    bytes
        .try_into()
        .map_err(|_| Error::configuration("encryptionKey", "must decode to exactly 32 bytes"))
}

/// In-process bookkeeping for a single cached credential, kept alongside
/// the adapter's serialized payload so eviction and TTL checks don't
/// require round-tripping through (de)serialization/decryption on every
/// `set`.
#[derive(Clone, Copy)]
struct IndexEntry {
    cached_at: i64,
    expires_at: i64,
}

/// The offline credential cache (component D). Thread-safe: `get`/`set`/
/// `delete` are atomic per key; eviction is serialized under the same
/// index lock.
pub struct Cache {
    config: CacheConfig,
    adapter: Arc<dyn StorageAdapter>,
    index: RwLock<HashMap<String, IndexEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sink: Option<Arc<dyn EventSink>>,
}

impl Cache {
    /// Build a cache over `adapter` with `config`. Validates the
    /// encryption key's shape, if set.
    pub fn new(adapter: Arc<dyn StorageAdapter>, config: CacheConfig) -> Result<Self> {
        #[cfg(feature = "encryption")]
        if let Some(key) = &config.encryption_key {
            resolve_encryption_key(key)?;
        }
        Ok(Self {
            config,
            adapter,
            index: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sink: None,
        })
    }

    /// Attach an [`EventSink`] so cache writes/evictions/clears emit
    /// `cache_update` events.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn notify(&self, key: &str, action: CacheAction) {
        if let Some(sink) = &self.sink {
            emit_guarded(sink.as_ref(), Event::CacheUpdate { key: key.to_string(), action });
        }
    }

    fn credential_key(vc_id: &str) -> String {
        format!("{CREDENTIAL_PREFIX}{vc_id}")
    }

    fn revocation_key(merkle_root: &str) -> String {
        format!("{REVOCATION_PREFIX}{merkle_root}")
    }

    fn did_key(did: &str) -> String {
        format!("{DID_PREFIX}{did}")
    }

    fn serialize(&self, value: &impl serde::Serialize) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(value)
            .map_err(|e| Error::CacheWriteFailed(format!("serialization failed: {e}")))?;
        self.maybe_encrypt(json)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(&self, raw: &[u8]) -> Result<T> {
        let plaintext = self.maybe_decrypt(raw)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::CacheReadFailed(format!("deserialization failed: {e}")))
    }

    #[cfg(feature = "encryption")]
    fn maybe_encrypt(&self, plaintext: Vec<u8>) -> Result<Vec<u8>> {
        let Some(hex_key) = &self.config.encryption_key else { return Ok(plaintext) };
        let key = resolve_encryption_key(hex_key)?;
        let iv_bytes = crypto::random_bytes(crypto::IV_LEN);
        let iv: [u8; crypto::IV_LEN] = iv_bytes.try_into().expect("IV_LEN bytes");
        let out = crypto::encrypt(&plaintext, &key, &iv, None)?;
        let envelope = Envelope {
            iv: crypto::to_hex(&out.iv),
            ct: crypto::to_hex(&out.ciphertext),
            tag: crypto::to_hex(&out.tag),
        };
        serde_json::to_vec(&envelope).map_err(|e| Error::CacheWriteFailed(e.to_string()))
    }

    #[cfg(not(feature = "encryption"))]
    fn maybe_encrypt(&self, plaintext: Vec<u8>) -> Result<Vec<u8>> {
        Ok(plaintext)
    }

    #[cfg(feature = "encryption")]
    fn maybe_decrypt(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let Some(hex_key) = &self.config.encryption_key else { return Ok(raw.to_vec()) };
        let key = resolve_encryption_key(hex_key)?;
        let envelope: Envelope =
            serde_json::from_slice(raw).map_err(|_| Error::DecryptionFailed)?;
        let iv_bytes = crypto::from_hex(&envelope.iv).map_err(|_| Error::DecryptionFailed)?;
        let iv: [u8; crypto::IV_LEN] = iv_bytes.try_into().map_err(|_| Error::DecryptionFailed)?;
        let ciphertext = crypto::from_hex(&envelope.ct).map_err(|_| Error::DecryptionFailed)?;
        let tag_bytes = crypto::from_hex(&envelope.tag).map_err(|_| Error::DecryptionFailed)?;
        let tag: [u8; crypto::TAG_LEN] = tag_bytes.try_into().map_err(|_| Error::DecryptionFailed)?;
        crypto::decrypt(&ciphertext, &tag, &key, &iv, None)
    }

    #[cfg(not(feature = "encryption"))]
    fn maybe_decrypt(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    /// Evict the oldest-by-`cached_at` entry (ties broken by lexicographic
    /// key) to make room under `max_entries`. Caller must hold the index
    /// write lock.
    fn evict_oldest(&self, index: &mut HashMap<String, IndexEntry>) -> Result<()> {
        let Some((oldest_key, _)) = index
            .iter()
            .min_by(|(ka, va), (kb, vb)| va.cached_at.cmp(&vb.cached_at).then_with(|| ka.cmp(kb)))
            .map(|(k, v)| (k.clone(), *v))
        else {
            return Ok(());
        };
        self.adapter.delete(&oldest_key)?;
        index.remove(&oldest_key);
        self.notify(&oldest_key, CacheAction::Evicted);
        Ok(())
    }

    /// Store `credential`. Defaults `cached_at`/`expires_at` to `now`/
    /// `now + max_age_secs` when the caller passed an entry without
    /// presetting them (i.e. as produced by
    /// [`CachedCredential::new`]). Evicts the oldest entry first if at
    /// capacity.
    pub fn set(&self, vc_id: &str, mut entry: CachedCredential, now: i64) -> Result<()> {
        let key = Self::credential_key(vc_id);
        let mut index = self.index.write().expect("cache index lock poisoned");
        if !index.contains_key(&key) && index.len() >= self.config.max_entries {
            self.evict_oldest(&mut index)?;
        }
        if entry.metadata.cached_at == 0 {
            entry.metadata.cached_at = now;
        }
        if entry.metadata.expires_at == 0 {
            entry.metadata.expires_at = now + self.config.max_age_secs;
        }
        let raw = self.serialize(&entry)?;
        self.adapter.set(&key, &raw)?;
        index.insert(
            key.clone(),
            IndexEntry { cached_at: entry.metadata.cached_at, expires_at: entry.metadata.expires_at },
        );
        drop(index);
        self.notify(&key, CacheAction::Set);
        Ok(())
    }

    /// Fetch a live entry for `vc_id`, deleting and reporting a miss if it
    /// has expired.
    pub fn get(&self, vc_id: &str, now: i64) -> Result<Option<CachedCredential>> {
        let result = self.peek(vc_id, now)?;
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(result)
    }

    /// Like [`Self::get`] but does not touch the hit/miss counters — used
    /// internally (bitmap lookups, stats) where reading an entry isn't
    /// itself a cache "access" worth counting.
    fn peek(&self, vc_id: &str, now: i64) -> Result<Option<CachedCredential>> {
        let key = Self::credential_key(vc_id);
        let Some(raw) = self.adapter.get(&key)? else { return Ok(None) };
        let entry: CachedCredential = self.deserialize(&raw)?;
        if !entry.is_alive(now) {
            self.delete(vc_id)?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// `get(vc_id).is_some()`.
    pub fn has(&self, vc_id: &str, now: i64) -> Result<bool> {
        Ok(self.get(vc_id, now)?.is_some())
    }

    /// Remove a single credential entry, regardless of TTL.
    pub fn delete(&self, vc_id: &str) -> Result<()> {
        let key = Self::credential_key(vc_id);
        self.adapter.delete(&key)?;
        self.index.write().expect("cache index lock poisoned").remove(&key);
        self.notify(&key, CacheAction::Deleted);
        Ok(())
    }

    /// Purge only the `credential:*` namespace (revocation lists and
    /// `meta:lastSyncTime` survive).
    pub fn clear(&self) -> Result<()> {
        let mut index = self.index.write().expect("cache index lock poisoned");
        let keys: Vec<String> = index.keys().cloned().collect();
        for key in &keys {
            self.adapter.delete(key)?;
        }
        index.clear();
        drop(index);
        self.notify(CREDENTIAL_PREFIX, CacheAction::Cleared);
        Ok(())
    }

    /// Remove every expired credential entry; returns the number removed.
    pub fn clean_expired(&self, now: i64) -> Result<usize> {
        let expired: Vec<String> = {
            let index = self.index.read().expect("cache index lock poisoned");
            index
                .iter()
                .filter(|(_, v)| v.expires_at <= now)
                .map(|(k, _)| k.trim_start_matches(CREDENTIAL_PREFIX).to_string())
                .collect()
        };
        for vc_id in &expired {
            self.delete(vc_id)?;
        }
        Ok(expired.len())
    }

    /// Store a revocation bitmap anchored at `merkle_root`.
    pub fn set_revocation_list(&self, merkle_root: &str, bitmap: Vec<u8>, now: i64) -> Result<()> {
        let key = Self::revocation_key(merkle_root);
        let list = RevocationList { merkle_root: merkle_root.to_string(), bitmap, updated_at: now };
        let raw = self.serialize(&list)?;
        self.adapter.set(&key, &raw)?;
        self.notify(&key, CacheAction::Set);
        Ok(())
    }

    /// Fetch the revocation bitmap anchored at `merkle_root`, if cached.
    pub fn get_revocation_list(&self, merkle_root: &str) -> Result<Option<RevocationList>> {
        let key = Self::revocation_key(merkle_root);
        match self.adapter.get(&key)? {
            Some(raw) => Ok(Some(self.deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether `vc_id` is revoked, per SPEC_FULL.md open question 1:
    /// consult the bitmap when both a recorded merkle root and credential
    /// index are available and the corresponding list is cached; otherwise
    /// fall back to the cached per-credential flag. `None` if the cache
    /// has nothing to say.
    pub fn is_revoked(&self, vc_id: &str, now: i64) -> Result<Option<bool>> {
        let Some(entry) = self.peek(vc_id, now)? else { return Ok(None) };
        if let (Some(merkle_root), Some(index)) =
            (&entry.revocation_status.merkle_root, entry.credential.credential_index)
        {
            if let Some(list) = self.get_revocation_list(merkle_root)? {
                return Ok(Some(list.is_revoked(index)));
            }
        }
        Ok(Some(entry.revocation_status.is_revoked))
    }

    /// Cache a resolved DID document, keyed by its own `id`. Not part of
    /// the wire namespaces in spec §4.4 — an enrichment so the holder's
    /// signature can still be checked offline after an online warm-up
    /// (scenario S5), since the cache otherwise only indexes credentials
    /// and revocation lists. No TTL: DID documents change rarely enough
    /// that staleness is a registry-sync concern, not a cache-eviction one.
    pub fn set_did_document(&self, did: &str, document: &crate::vc::DidDocument) -> Result<()> {
        let key = Self::did_key(did);
        let raw = self.serialize(document)?;
        self.adapter.set(&key, &raw)?;
        self.notify(&key, CacheAction::Set);
        Ok(())
    }

    /// Fetch a previously cached DID document, if any.
    pub fn get_did_document(&self, did: &str) -> Result<Option<crate::vc::DidDocument>> {
        match self.adapter.get(&Self::did_key(did))? {
            Some(raw) => Ok(Some(self.deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// The ids of every credential currently indexed (live or not yet
    /// swept), for [`CacheSync`] to enumerate.
    pub(crate) fn cached_vc_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .index
            .read()
            .expect("cache index lock poisoned")
            .keys()
            .map(|k| k.trim_start_matches(CREDENTIAL_PREFIX).to_string())
            .collect())
    }

    /// Record the last sync timestamp.
    pub fn set_last_sync_time(&self, now: i64) -> Result<()> {
        self.adapter.set(LAST_SYNC_KEY, now.to_string().as_bytes())
    }

    fn last_sync_time(&self) -> Result<Option<i64>> {
        Ok(self.adapter.get(LAST_SYNC_KEY)?.and_then(|raw| {
            std::str::from_utf8(&raw).ok().and_then(|s| s.parse().ok())
        }))
    }

    /// Aggregate statistics: entry counts, hit rate, last sync time,
    /// storage backend label, approximate size.
    pub fn stats(&self, now: i64) -> Result<CacheStats> {
        let index = self.index.read().expect("cache index lock poisoned");
        let total_entries = index.len();
        let expired_entries = index.values().filter(|v| v.expires_at <= now).count();
        drop(index);

        let mut revoked_entries = 0;
        for key in self.index.read().expect("cache index lock poisoned").keys().cloned().collect::<Vec<_>>() {
            let vc_id = key.trim_start_matches(CREDENTIAL_PREFIX);
            if let Some(entry) = self.peek(vc_id, now)? {
                if entry.revocation_status.is_revoked {
                    revoked_entries += 1;
                }
            }
        }

        Ok(CacheStats {
            total_entries,
            expired_entries,
            revoked_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            last_sync_time: self.last_sync_time()?,
            storage_backend: self.adapter.label().to_string(),
            size_bytes: self.adapter.size_bytes()?,
        })
    }

    /// Dump every `credential:*` and `revocation:*` entry (plus the last
    /// sync marker) as an opaque, forward-compatible JSON blob. Caches
    /// with an `encryptionKey` export their wrapped envelope form as-is —
    /// the blob stays encrypted.
    pub fn export(&self) -> Result<String> {
        let index = self.index.read().expect("cache index lock poisoned");
        let mut entries = HashMap::new();
        for key in index.keys() {
            if let Some(raw) = self.adapter.get(key)? {
                entries.insert(key.clone(), crypto::base64_encode(&raw));
            }
        }
        drop(index);
        let mut revocations = HashMap::new();
        for key in self.adapter.keys()? {
            if let Some(root) = key.strip_prefix(REVOCATION_PREFIX) {
                if let Some(raw) = self.adapter.get(&key)? {
                    revocations.insert(root.to_string(), crypto::base64_encode(&raw));
                }
            }
        }
        let blob = ExportBlob { credentials: entries, revocations, last_sync_time: self.last_sync_time()? };
        serde_json::to_string(&blob).map_err(|e| Error::CacheWriteFailed(e.to_string()))
    }

    /// Restore entries from a blob produced by [`Self::export`]. Existing
    /// entries with the same keys are overwritten; entries already present
    /// and not in the blob are left untouched.
    pub fn import(&self, blob: &str) -> Result<()> {
        let parsed: ExportBlob =
            serde_json::from_str(blob).map_err(|e| Error::CacheReadFailed(e.to_string()))?;
        let mut index = self.index.write().expect("cache index lock poisoned");
        for (key, encoded) in parsed.credentials {
            let raw = crypto::base64_decode(&encoded)?;
            self.adapter.set(&key, &raw)?;
            let entry: CachedCredential = self.deserialize(&raw)?;
            index.insert(
                key,
                IndexEntry { cached_at: entry.metadata.cached_at, expires_at: entry.metadata.expires_at },
            );
        }
        drop(index);
        for (root, encoded) in parsed.revocations {
            let raw = crypto::base64_decode(&encoded)?;
            self.adapter.set(&Self::revocation_key(&root), &raw)?;
        }
        if let Some(ts) = parsed.last_sync_time {
            self.set_last_sync_time(ts)?;
        }
        Ok(())
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Envelope {
    iv: String,
    ct: String,
    tag: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ExportBlob {
    credentials: HashMap<String, String>,
    revocations: HashMap<String, String>,
    last_sync_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vc::VcType;

    fn credential(vc_id: &str) -> crate::vc::VerifiableCredential {
        crate::vc::VerifiableCredential {
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

    fn cache(max_entries: usize) -> Cache {
        let config = CacheConfigBuilder::default().max_entries(max_entries).build().unwrap();
        Cache::new(Arc::new(InMemoryAdapter::new()), config).unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        let c = cache(10);
        let entry = CachedCredential::new(credential("vc_1"), 1_000, 3600);
        c.set("vc_1", entry.clone(), 1_000).unwrap();
        let fetched = c.get("vc_1", 1_500).unwrap().unwrap();
        assert_eq!(fetched.vc_id, "vc_1");
    }

    #[test]
    fn ttl_expiry_causes_miss_and_delete() {
        let c = cache(10);
        let entry = CachedCredential::new(credential("vc_1"), 1_000, 100);
        c.set("vc_1", entry, 1_000).unwrap();
        assert!(c.get("vc_1", 1_050).unwrap().is_some());
        assert!(c.get("vc_1", 1_200).unwrap().is_none());
        assert!(!c.has("vc_1", 1_200).unwrap());
    }

    #[test]
    fn max_entries_evicts_oldest() {
        let c = cache(2);
        c.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 3600), 1_000).unwrap();
        c.set("vc_2", CachedCredential::new(credential("vc_2"), 1_100, 3600), 1_100).unwrap();
        c.set("vc_3", CachedCredential::new(credential("vc_3"), 1_200, 3600), 1_200).unwrap();
        assert!(c.get("vc_1", 1_200).unwrap().is_none());
        assert!(c.get("vc_2", 1_200).unwrap().is_some());
        assert!(c.get("vc_3", 1_200).unwrap().is_some());
    }

    #[test]
    fn hit_rate_is_monotonic_and_undefined_when_empty() {
        let c = cache(10);
        let stats = c.stats(1_000).unwrap();
        assert_eq!(stats.hit_rate(), None);
        c.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 3600), 1_000).unwrap();
        c.get("vc_1", 1_000).unwrap();
        c.get("vc_missing", 1_000).unwrap();
        let stats = c.stats(1_000).unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn clean_expired_removes_only_stale_entries() {
        let c = cache(10);
        c.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 10), 1_000).unwrap();
        c.set("vc_2", CachedCredential::new(credential("vc_2"), 1_000, 10_000), 1_000).unwrap();
        let removed = c.clean_expired(1_100).unwrap();
        assert_eq!(removed, 1);
        assert!(c.get("vc_2", 1_100).unwrap().is_some());
    }

    #[test]
    fn export_import_round_trips_across_fresh_cache() {
        let source = cache(10);
        source.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 3600), 1_000).unwrap();
        source.set_revocation_list("root1", vec![0b1000_0000], 1_000).unwrap();
        let blob = source.export().unwrap();

        let dest = cache(10);
        dest.import(&blob).unwrap();
        assert!(dest.get("vc_1", 1_000).unwrap().is_some());
        assert_eq!(dest.get_revocation_list("root1").unwrap().unwrap().bitmap, vec![0b1000_0000]);
    }

    #[test]
    fn clear_purges_credentials_but_not_revocation_lists() {
        let c = cache(10);
        c.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 3600), 1_000).unwrap();
        c.set_revocation_list("root1", vec![0], 1_000).unwrap();
        c.clear().unwrap();
        assert!(c.get("vc_1", 1_000).unwrap().is_none());
        assert!(c.get_revocation_list("root1").unwrap().is_some());
    }

    #[test]
    fn is_revoked_prefers_bitmap_when_index_and_root_known() {
        let c = cache(10);
        let mut cred = credential("vc_1");
        cred.credential_index = Some(3);
        let mut entry = CachedCredential::new(cred, 1_000, 3600);
        entry.revocation_status.merkle_root = Some("root1".to_string());
        entry.revocation_status.is_revoked = false; // flag says no...
        c.set("vc_1", entry, 1_000).unwrap();
        // ...but the bitmap (bit 3 of byte 0, MSB-first) says yes.
        c.set_revocation_list("root1", vec![0b0001_0000], 1_000).unwrap();
        assert_eq!(c.is_revoked("vc_1", 1_000).unwrap(), Some(true));
    }

    #[test]
    fn is_revoked_falls_back_to_flag_without_bitmap() {
        let c = cache(10);
        let mut entry = CachedCredential::new(credential("vc_1"), 1_000, 3600);
        entry.revocation_status.is_revoked = true;
        c.set("vc_1", entry, 1_000).unwrap();
        assert_eq!(c.is_revoked("vc_1", 1_000).unwrap(), Some(true));
    }

    #[test]
    fn is_revoked_none_when_not_cached() {
        let c = cache(10);
        assert_eq!(c.is_revoked("vc_missing", 1_000).unwrap(), None);
    }

    #[test]
    fn did_document_round_trips_without_ttl() {
        let c = cache(10);
        let doc = crate::vc::DidDocument {
            id: "did:aura:testnet:holder".to_string(),
            controller: None,
            verification_method: vec![],
            authentication: vec![],
            service: vec![],
        };
        c.set_did_document(&doc.id, &doc).unwrap();
        assert_eq!(c.get_did_document(&doc.id).unwrap(), Some(doc));
    }

    #[cfg(feature = "encryption")]
    #[test]
    fn encrypted_cache_round_trips_and_rejects_bad_key() {
        let config = CacheConfigBuilder::default()
            .encryption_key(crypto::to_hex(&[7u8; 32]))
            .build()
            .unwrap();
        let c = Cache::new(Arc::new(InMemoryAdapter::new()), config).unwrap();
        c.set("vc_1", CachedCredential::new(credential("vc_1"), 1_000, 3600), 1_000).unwrap();
        assert!(c.get("vc_1", 1_000).unwrap().is_some());

        let bad_config = CacheConfigBuilder::default().encryption_key("00112233").build();
        assert!(bad_config.is_ok());
        assert!(Cache::new(Arc::new(InMemoryAdapter::new()), bad_config.unwrap()).is_err());
    }
}
