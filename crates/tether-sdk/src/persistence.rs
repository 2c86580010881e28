// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Key/value persistence.
//!
//! Frameworks keep small pieces of state (their framework id, leader leases)
//! in a key/value store. [`MemoryStore`] is the in-process implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Identifier of a lease handed out by [`KeyValueStore::create_with_lease`].
pub type LeaseId = i64;

/// Errors from a key/value store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("lease not found: {0}")]
    LeaseNotFound(LeaseId),
}

/// Key/value store interface.
#[allow(missing_docs)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Create a key. Fails if it already exists.
    async fn create(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Create a key that is deleted when its lease is not refreshed within `ttl`.
    async fn create_with_lease(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<LeaseId, StoreError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// All keys starting with `prefix`, in key order.
    async fn read_all(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Replace the value of an existing key.
    async fn update(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Push a lease's expiry another `ttl` into the future.
    async fn refresh_lease(&self, lease: LeaseId) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Write `value` under `key`, creating the key if needed.
pub async fn put(store: &dyn KeyValueStore, key: &str, value: &[u8]) -> Result<(), StoreError> {
    match store.update(key, value).await {
        Err(StoreError::NotFound(_)) => store.create(key, value).await,
        other => other,
    }
}

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    lease: Option<LeaseId>,
}

#[derive(Debug)]
struct Lease {
    ttl: Duration,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    leases: HashMap<LeaseId, Lease>,
    next_lease: LeaseId,
}

impl Inner {
    /// Drop expired leases and the keys attached to them.
    fn expire(&mut self, now: DateTime<Utc>) {
        let expired: Vec<LeaseId> = self
            .leases
            .iter()
            .filter(|(_, lease)| lease.expires_at <= now)
            .map(|(id, _)| *id)
            .collect();
        if expired.is_empty() {
            return;
        }

        for id in &expired {
            self.leases.remove(id);
        }
        self.entries
            .retain(|_, entry| !entry.lease.is_some_and(|id| expired.contains(&id)));
        debug!(leases = expired.len(), "Expired leases");
    }
}

/// In-memory [`KeyValueStore`]. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock(Utc::now()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self, now: DateTime<Utc>) -> MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.expire(now);
        inner
    }

    fn insert(&self, key: &str, value: &[u8], lease: Option<LeaseId>) -> Result<(), StoreError> {
        let mut inner = self.lock(Utc::now());
        if inner.entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                lease,
            },
        );
        Ok(())
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn create(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.insert(key, value, None)
    }

    async fn create_with_lease(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<LeaseId, StoreError> {
        let now = Utc::now();
        let mut inner = self.lock(now);
        if inner.entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }

        inner.next_lease += 1;
        let id = inner.next_lease;
        inner.leases.insert(
            id,
            Lease {
                ttl,
                expires_at: expiry(now, ttl),
            },
        );
        inner.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                lease: Some(id),
            },
        );
        Ok(id)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.lock(Utc::now())
            .entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn read_all(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let inner = self.lock(Utc::now());
        Ok(inner
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    async fn update(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.lock(Utc::now());
        let entry = inner
            .entries
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        entry.value = value.to_vec();
        Ok(())
    }

    async fn refresh_lease(&self, lease: LeaseId) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut inner = self.lock(now);
        let entry = inner
            .leases
            .get_mut(&lease)
            .ok_or(StoreError::LeaseNotFound(lease))?;
        entry.expires_at = expiry(now, entry.ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock(Utc::now());
        let entry = inner
            .entries
            .remove(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if let Some(id) = entry.lease {
            inner.leases.remove(&id);
        }
        Ok(())
    }
}
