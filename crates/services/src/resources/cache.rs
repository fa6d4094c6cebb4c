use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sprint_core::Clock;
use sprint_core::model::{Resource, SkillId};
use storage::repository::KvStore;
use storage::resource_cache_key;

/// Entries older than this are stale and get re-fetched.
pub const RESOURCE_CACHE_TTL_SECS: i64 = 60 * 60;

/// Documents above this size are refused as oversized.
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Filtered resources for one subskill and the time they were fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    // Stored as the document key, not inside the entry.
    #[serde(skip)]
    pub subskill: String,
    pub resources: Vec<Resource>,
    pub fetched_at: DateTime<Utc>,
}

/// TTL-bound map from subskill name to its filtered resources, persisted as one
/// document per skill.
///
/// Entries are replaced whole, never patched. The in-memory map is the source of
/// truth; every mutation rewrites the persisted document. A document that cannot
/// be serialized empties the cache and switches it to memory only; a failed write
/// keeps the entries but also stops persisting.
pub struct ResourceCache {
    store: Arc<dyn KvStore>,
    storage_key: String,
    clock: Clock,
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    memory_only: AtomicBool,
    // Serializes snapshot+write so the last mutation is the last document written.
    persist_lock: tokio::sync::Mutex<()>,
}

impl ResourceCache {
    /// An empty cache for `skill_id`; nothing is read from the store.
    #[must_use]
    pub fn empty(store: Arc<dyn KvStore>, skill_id: SkillId, clock: Clock) -> Self {
        Self {
            store,
            storage_key: resource_cache_key(skill_id),
            clock,
            ttl: Duration::seconds(RESOURCE_CACHE_TTL_SECS),
            entries: Mutex::new(HashMap::new()),
            memory_only: AtomicBool::new(false),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Rehydrate the cache for `skill_id` from durable storage.
    ///
    /// Stale entries are kept (and stay in storage) but are never served as fresh.
    /// A missing, unreadable, oversized or corrupt document yields an empty cache.
    pub async fn load(store: Arc<dyn KvStore>, skill_id: SkillId, clock: Clock) -> Self {
        let cache = Self::empty(store, skill_id, clock);
        let raw = match cache.store.get(&cache.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return cache,
            Err(err) => {
                tracing::warn!(key = %cache.storage_key, error = %err, "resource cache unreadable; starting empty");
                return cache;
            }
        };

        match decode_document(&raw) {
            Ok(entries) => {
                tracing::debug!(key = %cache.storage_key, entries = entries.len(), "resource cache rehydrated");
                *cache.lock() = entries;
            }
            Err(reason) => {
                tracing::warn!(key = %cache.storage_key, %reason, "resource cache corrupt; starting empty");
            }
        }
        cache
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True once a write failure has switched the cache to memory only.
    #[must_use]
    pub fn is_memory_only(&self) -> bool {
        self.memory_only.load(Ordering::Acquire)
    }

    /// The stored entry for `subskill`, fresh or not.
    #[must_use]
    pub fn get(&self, subskill: &str) -> Option<CacheEntry> {
        self.lock().get(subskill).cloned()
    }

    /// The entry for `subskill` only if it is still within the TTL.
    #[must_use]
    pub fn get_fresh(&self, subskill: &str) -> Option<CacheEntry> {
        self.get(subskill).filter(|entry| self.is_fresh(entry))
    }

    /// `now - fetched_at < ttl`.
    #[must_use]
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.is_within(entry.fetched_at, self.ttl)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `resources` for `subskill` stamped with the current time, replacing any
    /// previous entry, then persist the whole cache.
    pub async fn put(&self, subskill: &str, resources: Vec<Resource>) -> CacheEntry {
        let entry = self.stamp(subskill, resources);
        self.lock().insert(entry.subskill.clone(), entry.clone());
        self.persist().await;
        entry
    }

    /// Store several entries as one mutation with a single persist.
    pub async fn put_many(&self, items: Vec<(String, Vec<Resource>)>) {
        if items.is_empty() {
            return;
        }
        {
            let mut guard = self.lock();
            for (subskill, resources) in items {
                let entry = self.stamp(&subskill, resources);
                guard.insert(subskill, entry);
            }
        }
        self.persist().await;
    }

    fn stamp(&self, subskill: &str, resources: Vec<Resource>) -> CacheEntry {
        CacheEntry {
            subskill: subskill.to_owned(),
            resources,
            fetched_at: self.clock.now(),
        }
    }

    async fn persist(&self) {
        if self.is_memory_only() {
            return;
        }
        let _serialized = self.persist_lock.lock().await;
        let snapshot = self.lock().clone();

        let encoded = match encode_document(&snapshot) {
            Ok(encoded) => encoded,
            Err(reason) => {
                // The stored document is left for the next successful write to replace.
                tracing::warn!(key = %self.storage_key, %reason, "resource cache not serializable; continuing empty in memory");
                self.memory_only.store(true, Ordering::Release);
                self.lock().clear();
                return;
            }
        };

        if let Err(err) = self.store.put(&self.storage_key, &encoded).await {
            tracing::warn!(key = %self.storage_key, error = %err, "resource cache write failed; continuing in memory");
            self.memory_only.store(true, Ordering::Release);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned map is still a consistent map: entries are replaced whole.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("storage_key", &self.storage_key)
            .field("entries", &self.len())
            .field("memory_only", &self.is_memory_only())
            .finish_non_exhaustive()
    }
}

fn encode_document(entries: &HashMap<String, CacheEntry>) -> Result<String, String> {
    let encoded = serde_json::to_string(entries).map_err(|err| err.to_string())?;
    if encoded.len() > MAX_DOCUMENT_BYTES {
        return Err(format!("document is {} bytes", encoded.len()));
    }
    Ok(encoded)
}

fn decode_document(raw: &str) -> Result<HashMap<String, CacheEntry>, String> {
    if raw.len() > MAX_DOCUMENT_BYTES {
        return Err(format!("document is {} bytes", raw.len()));
    }
    let mut entries: HashMap<String, CacheEntry> =
        serde_json::from_str(raw).map_err(|err| err.to_string())?;
    // The map key is authoritative.
    for (key, entry) in &mut entries {
        entry.subskill.clone_from(key);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sprint_core::time::fixed_now;
    use storage::repository::{InMemoryKvStore, StorageError};

    /// Reads succeed, every write fails.
    struct ReadOnlyStore {
        inner: InMemoryKvStore,
    }

    #[async_trait]
    impl KvStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }
    }

    fn resource(i: usize) -> Resource {
        Resource::new(
            format!("Resource number {i}"),
            "A description that is long enough",
            format!("https://blog.dev/{i}"),
            "article",
        )
    }

    #[tokio::test]
    async fn get_after_put_returns_stored_entry() {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = ResourceCache::empty(store, SkillId::new(1), Clock::fixed(fixed_now()));
        let stored = cache.put("Loops", vec![resource(1)]).await;

        assert_eq!(cache.get("Loops"), Some(stored.clone()));
        assert_eq!(cache.get_fresh("Loops"), Some(stored));
    }

    #[tokio::test]
    async fn entry_goes_stale_after_ttl() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let cache = ResourceCache::empty(Arc::clone(&store), SkillId::new(1), Clock::fixed(fixed_now()));
        cache.put("Loops", vec![resource(1)]).await;

        let mut later = Clock::fixed(fixed_now());
        later.advance(Duration::seconds(RESOURCE_CACHE_TTL_SECS));
        let reloaded = ResourceCache::load(store, SkillId::new(1), later).await;

        let entry = reloaded.get("Loops").expect("stale entry is kept");
        assert!(!reloaded.is_fresh(&entry));
        assert!(reloaded.get_fresh("Loops").is_none());
    }

    #[tokio::test]
    async fn survives_reload_through_store() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let clock = Clock::fixed(fixed_now());
        let cache = ResourceCache::empty(Arc::clone(&store), SkillId::new(7), clock);
        cache
            .put_many(vec![
                ("Loops".into(), vec![resource(1)]),
                ("Recursion".into(), vec![resource(2), resource(3)]),
            ])
            .await;

        let reloaded = ResourceCache::load(store, SkillId::new(7), clock).await;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get_fresh("Recursion").unwrap().resources.len(), 2);
    }

    #[tokio::test]
    async fn caches_are_scoped_per_skill() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let clock = Clock::fixed(fixed_now());
        ResourceCache::empty(Arc::clone(&store), SkillId::new(1), clock)
            .put("Loops", vec![resource(1)])
            .await;

        let other = ResourceCache::load(store, SkillId::new(2), clock).await;
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn put_overwrites_whole_entry() {
        let store = Arc::new(InMemoryKvStore::new());
        let cache = ResourceCache::empty(store, SkillId::new(1), Clock::fixed(fixed_now()));
        cache.put("Loops", vec![resource(1), resource(2)]).await;
        cache.put("Loops", vec![resource(3)]).await;
        assert_eq!(cache.get("Loops").unwrap().resources, vec![resource(3)]);
    }

    #[tokio::test]
    async fn corrupt_document_degrades_to_empty() {
        let store = Arc::new(InMemoryKvStore::new());
        store
            .put(&resource_cache_key(SkillId::new(1)), "{not json")
            .await
            .unwrap();
        let cache = ResourceCache::load(store, SkillId::new(1), Clock::fixed(fixed_now())).await;
        assert!(cache.is_empty());
        assert!(!cache.is_memory_only());
    }

    #[tokio::test]
    async fn oversized_document_degrades_to_empty_memory_cache() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let cache = ResourceCache::empty(Arc::clone(&store), SkillId::new(1), Clock::fixed(fixed_now()));
        cache.put("Recursion", vec![resource(1)]).await;
        let persisted = store.get(cache.storage_key()).await.unwrap();
        assert!(persisted.is_some());

        let huge = Resource::new(
            "Huge resource title",
            "x".repeat(MAX_DOCUMENT_BYTES + 1),
            "https://blog.dev/huge",
            "article",
        );
        cache.put("Loops", vec![huge]).await;

        assert!(cache.is_memory_only());
        assert!(cache.is_empty());
        assert_eq!(store.get(cache.storage_key()).await.unwrap(), persisted);

        cache.put("Loops", vec![resource(2)]).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(store.get(cache.storage_key()).await.unwrap(), persisted);
    }

    #[tokio::test]
    async fn failed_write_keeps_entries_in_memory() {
        let store = Arc::new(ReadOnlyStore {
            inner: InMemoryKvStore::new(),
        });
        let cache = ResourceCache::empty(store, SkillId::new(1), Clock::fixed(fixed_now()));
        let stored = cache.put("Loops", vec![resource(1)]).await;

        assert!(cache.is_memory_only());
        assert_eq!(cache.get_fresh("Loops"), Some(stored));

        cache.put("Recursion", vec![resource(2)]).await;
        assert_eq!(cache.len(), 2);
    }
}
