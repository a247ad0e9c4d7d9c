//! Recently-viewed catalog items.
//!
//! A bounded, recency-ordered, deduplicating list of catalog item snapshots.
//! Every mutation builds a fresh sequence and swaps it in whole, then writes the
//! full snapshot to the durable store. Persistence problems are logged and
//! otherwise ignored: the in-memory list keeps working for the session.

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::{CatalogEntry, CatalogItem};
use crate::store::{DurableStore, StoreError};

/// Maximum number of items remembered.
pub const CAPACITY: usize = 8;

/// Store key the snapshot is written under.
pub const STORE_KEY: &str = "recently-viewed";

pub struct PersonalizationCache<T = CatalogItem> {
    entries: RwLock<Arc<[T]>>,
    /// Held across a mutation and its snapshot write, so snapshots reach the
    /// store in mutation order while readers only wait for the in-memory swap.
    writer: Mutex<()>,
    store: Arc<dyn DurableStore>,
}

impl<T> PersonalizationCache<T>
where
    T: CatalogEntry + Clone + Serialize + DeserializeOwned,
{
    /// Create the cache, restoring whatever snapshot `store` holds.
    ///
    /// A missing, unreadable or malformed snapshot yields an empty cache.
    pub fn open(store: Arc<dyn DurableStore>) -> Self {
        let restored = load_snapshot::<T>(store.as_ref());
        debug!(entries = restored.len(), "recently-viewed cache restored");

        Self {
            entries: RwLock::new(restored.into()),
            writer: Mutex::new(()),
            store,
        }
    }

    /// Record a view of `item`.
    ///
    /// Any older entry with the same identifier is dropped, `item` goes to the
    /// front, and the list is cut back to [`CAPACITY`].
    pub fn add(&self, item: T) {
        let _writer = self.writer.lock();
        let identifier = item.identifier().to_string();

        let next: Arc<[T]> = {
            let mut entries = self.entries.write();
            let rest: Vec<T> = entries
                .iter()
                .filter(|existing| existing.identifier() != identifier)
                .take(CAPACITY - 1)
                .cloned()
                .collect();
            let next: Arc<[T]> = std::iter::once(item).chain(rest).collect();
            *entries = Arc::clone(&next);
            next
        };
        debug!(identifier = %identifier, entries = next.len(), "recently-viewed item added");

        self.persist(&next);
    }

    /// Forget every entry, persisting the empty snapshot.
    pub fn clear(&self) {
        let _writer = self.writer.lock();
        let empty: Arc<[T]> = Arc::from(Vec::new());
        *self.entries.write() = Arc::clone(&empty);
        debug!("recently-viewed cache cleared");
        self.persist(&empty);
    }

    /// Current entries, most recent first.
    pub fn list(&self) -> Arc<[T]> {
        Arc::clone(&self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries
            .read()
            .iter()
            .any(|entry| entry.identifier() == identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<T> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.identifier() == identifier)
            .cloned()
    }

    fn persist(&self, entries: &[T]) {
        let result = serde_json::to_vec(entries)
            .map_err(StoreError::from)
            .and_then(|bytes| self.store.set(STORE_KEY, &bytes));

        if let Err(e) = result {
            warn!(error = %e, key = STORE_KEY, "failed to persist recently-viewed snapshot");
        }
    }
}

fn load_snapshot<T>(store: &dyn DurableStore) -> Vec<T>
where
    T: CatalogEntry + DeserializeOwned,
{
    let bytes = match store.get(STORE_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, key = STORE_KEY, "failed to read recently-viewed snapshot, starting empty");
            return Vec::new();
        }
    };

    let raw = match serde_json::from_slice::<Vec<Value>>(&bytes) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, key = STORE_KEY, "malformed recently-viewed snapshot, starting empty");
            return Vec::new();
        }
    };

    // One undecodable entry only costs that entry.
    let items = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, index, key = STORE_KEY, "skipping unreadable recently-viewed entry");
                None
            }
        })
        .collect();

    normalize(items)
}

/// Drop duplicate identifiers (keeping the earliest, most recent position) and
/// anything past capacity.
fn normalize<T: CatalogEntry>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.identifier().to_string()))
        .take(CAPACITY)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{mpsc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn item(id: &str) -> CatalogItem {
        CatalogItem::new(id).with_field("title", format!("Product {}", id))
    }

    fn ids(cache: &PersonalizationCache) -> Vec<String> {
        cache.list().iter().map(|i| i.id.clone()).collect()
    }

    fn create_test_cache() -> (PersonalizationCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = PersonalizationCache::open(store.clone());
        (cache, store)
    }

    fn persisted_ids(store: &MemoryStore) -> Vec<String> {
        let bytes = store.get(STORE_KEY).expect("get").expect("snapshot written");
        let items: Vec<CatalogItem> = serde_json::from_slice(&bytes).expect("valid snapshot");
        items.into_iter().map(|i| i.id).collect()
    }

    // ==================== add ====================

    #[test]
    fn test_new_cache_is_empty() {
        let (cache, store) = create_test_cache();
        assert!(cache.is_empty());
        assert!(cache.list().is_empty());
        // Opening does not write anything
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_prepends() {
        let (cache, _store) = create_test_cache();
        cache.add(item("a"));
        cache.add(item("b"));
        cache.add(item("c"));
        assert_eq!(ids(&cache), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_readd_moves_to_front_without_growing() {
        let (cache, _store) = create_test_cache();
        cache.add(item("a"));
        cache.add(item("b"));
        cache.add(item("c"));
        cache.add(item("a"));
        assert_eq!(ids(&cache), vec!["a", "c", "b"]);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_readd_keeps_latest_payload() {
        let (cache, _store) = create_test_cache();
        cache.add(CatalogItem::new("a").with_field("price", "10.00"));
        cache.add(CatalogItem::new("a").with_field("price", "12.00"));

        let list = cache.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].field("price"), Some(&json!("12.00")));
    }

    #[test]
    fn test_ninth_item_evicts_oldest() {
        let (cache, _store) = create_test_cache();
        for i in 1..=9 {
            cache.add(item(&i.to_string()));
        }

        assert_eq!(cache.len(), CAPACITY);
        assert!(!cache.contains("1"));
        assert_eq!(ids(&cache), vec!["9", "8", "7", "6", "5", "4", "3", "2"]);
    }

    #[test]
    fn test_readd_at_capacity_does_not_evict() {
        let (cache, _store) = create_test_cache();
        for i in 1..=8 {
            cache.add(item(&i.to_string()));
        }
        cache.add(item("1"));

        assert_eq!(cache.len(), CAPACITY);
        assert_eq!(ids(&cache), vec!["1", "8", "7", "6", "5", "4", "3", "2"]);
    }

    #[test]
    fn test_list_is_a_stable_snapshot() {
        let (cache, _store) = create_test_cache();
        cache.add(item("a"));
        let before = cache.list();
        cache.add(item("b"));

        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id, "a");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_and_contains() {
        let (cache, _store) = create_test_cache();
        cache.add(item("a"));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.get("a").map(|i| i.id), Some("a".to_string()));
        assert!(cache.get("b").is_none());
    }

    // ==================== persistence ====================

    #[test]
    fn test_add_persists_full_snapshot() {
        let (cache, store) = create_test_cache();
        cache.add(item("a"));
        cache.add(item("b"));
        assert_eq!(persisted_ids(&store), vec!["b", "a"]);
    }

    #[test]
    fn test_clear_empties_list_and_snapshot() {
        let (cache, store) = create_test_cache();
        cache.add(item("a"));
        cache.add(item("b"));
        cache.clear();

        assert!(cache.list().is_empty());
        assert_eq!(store.get(STORE_KEY).expect("get"), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_restart_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let before = {
            let cache: PersonalizationCache = PersonalizationCache::open(store.clone());
            for id in ["a", "b", "c", "b"] {
                cache.add(item(id));
            }
            cache.list()
        };

        let reopened: PersonalizationCache = PersonalizationCache::open(store);
        assert_eq!(&*reopened.list(), &*before);
    }

    #[test]
    fn test_malformed_snapshot_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(STORE_KEY, b"{not json").expect("set");

        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_wrong_shape_snapshot_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(STORE_KEY, br#"{"state":{"items":[]}}"#).expect("set");

        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unreadable_store_starts_empty() {
        let store = Arc::new(MemoryStore::failing());
        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let cache: PersonalizationCache = PersonalizationCache::open(store.clone());

        cache.add(item("a"));
        cache.add(item("b"));
        assert_eq!(ids(&cache), vec!["b", "a"]);
        assert!(store.is_empty());

        // Next successful write carries the whole in-memory state
        store.set_fail_writes(false);
        cache.add(item("c"));
        assert_eq!(persisted_ids(&store), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_bad_entry_only_drops_itself() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                STORE_KEY,
                br#"[{"id":"a","title":"A"},{"title":"no id"},{"id":7},{"id":"c"}]"#,
            )
            .expect("set");

        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert_eq!(ids(&cache), vec!["a", "c"]);
    }

    #[test]
    fn test_duplicate_id_keys_in_snapshot_keep_other_entries() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                STORE_KEY,
                br#"[{"id":"b","id":"shadow"},{"id":"a","title":"A"}]"#,
            )
            .expect("set");

        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get("a").and_then(|i| i.field("title").cloned()),
            Some(json!("A"))
        );
    }

    #[test]
    fn test_id_shaped_field_survives_restart() {
        let store = Arc::new(MemoryStore::new());
        {
            let cache: PersonalizationCache = PersonalizationCache::open(store.clone());
            cache.add(CatalogItem::new("a").with_field("title", "A"));
            cache.add(CatalogItem::new("b").with_field("id", "shadow"));
        }

        let reopened: PersonalizationCache = PersonalizationCache::open(store);
        assert_eq!(ids(&reopened), vec!["b", "a"]);
    }

    #[test]
    fn test_oversized_snapshot_is_normalized() {
        let store = Arc::new(MemoryStore::new());
        let items: Vec<CatalogItem> = ["a", "b", "a", "c", "d", "e", "f", "g", "h", "i"]
            .iter()
            .map(|id| item(id))
            .collect();
        store
            .set(STORE_KEY, &serde_json::to_vec(&items).expect("serialize"))
            .expect("set");

        let cache: PersonalizationCache = PersonalizationCache::open(store);
        assert_eq!(ids(&cache), vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }

    /// Parks inside `set` until the test lets it go.
    struct SlowStore {
        entered: Barrier,
        release: Barrier,
    }

    impl DurableStore for SlowStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StoreError> {
            self.entered.wait();
            self.release.wait();
            Ok(())
        }
    }

    #[test]
    fn test_readers_do_not_wait_for_snapshot_write() {
        let store = Arc::new(SlowStore {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        let cache: Arc<PersonalizationCache> = Arc::new(PersonalizationCache::open(store.clone()));

        let writer = thread::spawn({
            let cache = Arc::clone(&cache);
            move || cache.add(item("a"))
        });
        store.entered.wait();

        // The write is parked in the store; a reader must still get through.
        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn({
            let cache = Arc::clone(&cache);
            move || {
                let _ = tx.send(ids(&cache));
            }
        });
        let seen = rx.recv_timeout(Duration::from_secs(5));

        store.release.wait();
        writer.join().expect("writer");
        reader.join().expect("reader");

        assert_eq!(seen.expect("reader blocked behind the store write"), vec!["a"]);
    }

    // ==================== typed entries ====================

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        handle: String,
        title: String,
    }

    impl CatalogEntry for Product {
        fn identifier(&self) -> &str {
            &self.handle
        }
    }

    #[test]
    fn test_typed_entries() {
        let store = Arc::new(MemoryStore::new());
        let cache: PersonalizationCache<Product> = PersonalizationCache::open(store.clone());
        cache.add(Product {
            handle: "eco-soap-bar".to_string(),
            title: "Eco Soap Bar".to_string(),
        });

        let reopened: PersonalizationCache<Product> = PersonalizationCache::open(store);
        assert_eq!(reopened.list()[0].title, "Eco Soap Bar");
    }

    // ==================== invariants ====================

    proptest! {
        #[test]
        fn prop_bounded_and_unique(ops in proptest::collection::vec(0u8..20, 0..64)) {
            let (cache, _store) = create_test_cache();
            for id in &ops {
                cache.add(item(&id.to_string()));
            }

            let list = cache.list();
            prop_assert!(list.len() <= CAPACITY);

            let unique: HashSet<&str> = list.iter().map(|i| i.id.as_str()).collect();
            prop_assert_eq!(unique.len(), list.len());

            if let Some(last) = ops.last() {
                prop_assert_eq!(&list[0].id, &last.to_string());
            }
        }

        #[test]
        fn prop_order_matches_last_occurrence(ops in proptest::collection::vec(0u8..12, 1..40)) {
            let (cache, _store) = create_test_cache();
            for id in &ops {
                cache.add(item(&id.to_string()));
            }

            // Expected: distinct ids ordered by their most recent add, newest first.
            let mut expected: Vec<String> = Vec::new();
            for id in ops.iter().rev() {
                let id = id.to_string();
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
            expected.truncate(CAPACITY);

            prop_assert_eq!(ids(&cache), expected);
        }
    }
}
