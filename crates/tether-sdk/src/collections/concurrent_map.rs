// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Read/write locked hash map with snapshot iteration.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A hash map guarded by a read/write lock.
///
/// Writers take the lock exclusively; readers share it. Iteration copies the
/// entries out first, so the lock is released before the caller sees the
/// first item and concurrent writers never block on a slow consumer.
///
/// A panic while the lock is held does not make the map unusable: every
/// operation here leaves the map consistent, so a poisoned lock is recovered.
#[derive(Debug)]
pub struct ConcurrentMap<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for ConcurrentMap<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a value, returning the previous one for the key.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.write().insert(key, value)
    }

    /// Insert only if the key is absent. Returns `false` if it was present.
    pub fn insert_if_absent(&self, key: K, value: V) -> bool {
        let mut map = self.write();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, value);
        true
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.write().remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Mutate the value for `key` in place under the write lock.
    ///
    /// Returns `None` if the key is absent.
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.write().get_mut(key).map(f)
    }

    /// True if any value satisfies the predicate.
    pub fn any(&self, mut f: impl FnMut(&V) -> bool) -> bool {
        self.read().values().any(|v| f(v))
    }
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn get(&self, key: &K) -> Option<V> {
        self.read().get(key).cloned()
    }

    /// Snapshot of all entries.
    ///
    /// Entries inserted or removed after the call are not reflected.
    pub fn iter(&self) -> std::vec::IntoIter<(K, V)> {
        let snapshot: Vec<(K, V)> = self
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        snapshot.into_iter()
    }

    /// Snapshot of the values matching the predicate.
    pub fn filter_values(&self, mut f: impl FnMut(&V) -> bool) -> Vec<V> {
        self.read().values().filter(|v| f(v)).cloned().collect()
    }

    pub fn keys(&self) -> Vec<K> {
        self.read().keys().cloned().collect()
    }
}
