//! Storage implementations for registries.
//!
//! Provides concurrent, sharded storage for conditionals and rate limiters.

use crate::application::ports::Storage;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for writes,
/// making it suitable for lookups on every logging call.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, RandomState>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Check if a key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Implement the Storage port
impl<K, V> Storage<K, V> for ShardedStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let entry = self.map.entry(key);
        let mut value_ref = entry.or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.map.get(key).map(|value| value.value().clone())
    }

    fn insert_if_absent(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        match self.map.entry(key) {
            Entry::Occupied(existing) => (existing.get().clone(), false),
            Entry::Vacant(vacant) => (vacant.insert(value).value().clone(), true),
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for entry in self.map.iter() {
            f(entry.key(), entry.value());
        }
    }
}

// Implement Storage for Arc<ShardedStorage> to allow it to be used directly
impl<K, V> Storage<K, V> for std::sync::Arc<ShardedStorage<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug,
    V: Send + Sync + std::fmt::Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        (**self).get(key)
    }

    fn insert_if_absent(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        (**self).insert_if_absent(key, value)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        (**self).for_each(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let storage = ShardedStorage::new();

        storage.insert_if_absent("key1".to_string(), 100);
        storage.insert_if_absent("key2".to_string(), 200);

        assert_eq!(storage.get("key1"), Some(100));
        assert_eq!(storage.get("key2"), Some(200));
        assert_eq!(storage.get("key3"), None);
        assert!(storage.contains_key("key1"));

        assert_eq!(Storage::len(&storage), 2);
        assert!(!Storage::is_empty(&storage));
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let storage = ShardedStorage::new();

        assert_eq!(storage.insert_if_absent("key", 1), (1, true));
        assert_eq!(storage.insert_if_absent("key", 2), (1, false));
        assert_eq!(storage.get(&"key"), Some(1));
    }

    #[test]
    fn test_with_entry_mut_creates_once() {
        let storage = ShardedStorage::new();

        let first = storage.with_entry_mut("counter", || 10, |v| {
            *v += 1;
            *v
        });
        let second = storage.with_entry_mut("counter", || 1000, |v| {
            *v += 1;
            *v
        });

        assert_eq!(first, 11);
        assert_eq!(second, 12);
    }

    #[test]
    fn test_clear_and_for_each() {
        let storage = ShardedStorage::new();

        storage.insert_if_absent("key1", 100);
        storage.insert_if_absent("key2", 200);

        let mut sum = 0;
        storage.for_each(|_, v| sum += *v);
        assert_eq!(sum, 300);

        Storage::clear(&storage);
        assert!(Storage::is_empty(&storage));
    }

    #[test]
    fn test_concurrent_insert_if_absent() {
        let storage = Arc::new(ShardedStorage::new());
        let mut handles = vec![];

        for i in 0..10 {
            let storage_clone = Arc::clone(&storage);
            handles.push(thread::spawn(move || {
                storage_clone.insert_if_absent("shared".to_string(), i).0
            }));
        }

        let winners: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every thread observes the same stored value
        assert!(winners.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(Storage::len(&storage), 1);
    }
}
