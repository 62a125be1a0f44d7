use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;

/// Chained-bucket hash map shared across indexing workers.
///
/// One mutex guards the whole table; hashing spreads contention across
/// chains. The key only selects a bucket: elements within a chain are
/// identified by a caller-supplied predicate, so a value can be matched
/// structurally rather than by raw key equality.
pub struct ThreadSafeMap<V> {
    buckets: Mutex<Vec<Vec<Arc<V>>>>,
    bucket_count: usize,
}

impl<V> ThreadSafeMap<V> {
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be positive");
        Self {
            buckets: Mutex::new(vec![Vec::new(); bucket_count]),
            bucket_count,
        }
    }

    fn bucket_of(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.bucket_count
    }

    /// First element in `key`'s chain accepted by `matches`, if any.
    pub fn find<F>(&self, key: &str, matches: F) -> Option<Arc<V>>
    where
        F: Fn(&V) -> bool,
    {
        let buckets = self.buckets.lock();
        for v in &buckets[self.bucket_of(key)] {
            if matches(v) {
                return Some(Arc::clone(v));
            }
        }
        None
    }

    /// Returns the existing match or inserts `create()` under one critical
    /// section. A separate find followed by an insert is not equivalent: two
    /// workers racing on a new key would each insert, duplicating the entry
    /// and losing updates made through the other handle.
    pub fn find_or_create<F, C>(&self, key: &str, matches: F, create: C) -> Arc<V>
    where
        F: Fn(&V) -> bool,
        C: FnOnce() -> V,
    {
        let mut buckets = self.buckets.lock();
        let idx = self.bucket_of(key);
        let chain = &mut buckets[idx];
        for v in chain.iter() {
            if matches(v) {
                return Arc::clone(v);
            }
        }
        let v = Arc::new(create());
        chain.push(Arc::clone(&v));
        v
    }

    /// Atomically unlinks and returns the first match; the caller takes over
    /// the returned handle.
    pub fn remove<F>(&self, key: &str, matches: F) -> Option<Arc<V>>
    where
        F: Fn(&V) -> bool,
    {
        let mut buckets = self.buckets.lock();
        let idx = self.bucket_of(key);
        let chain = &mut buckets[idx];
        let pos = chain.iter().position(|v| matches(v))?;
        Some(chain.remove(pos))
    }

    /// Visits every element in bucket order, then chain order. The visitor
    /// must not insert into or remove from this map.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&V),
    {
        let buckets = self.buckets.lock();
        for chain in buckets.iter() {
            for v in chain {
                visit(v);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.lock().iter().map(|chain| chain.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
