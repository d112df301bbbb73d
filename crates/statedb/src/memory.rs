use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::{KvError, KvResult};
use crate::store::KvStore;

/// In-memory [`KvStore`].
///
/// Each `hset` mutates one map entry under the shard lock, which gives the
/// per-key atomicity the trait requires. Failure injection and counters
/// make it usable as a test double.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    data: Arc<DashMap<String, HashMap<String, String>>>,
    fail_on_read: Arc<AtomicBool>,
    fail_on_write: Arc<AtomicBool>,
    write_count: Arc<AtomicU32>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next read fail
    pub fn fail_next_read(&self) {
        self.fail_on_read.store(true, Ordering::SeqCst);
    }

    /// Make the next write fail
    pub fn fail_next_write(&self) {
        self.fail_on_write.store(true, Ordering::SeqCst);
    }

    /// Number of `hset` calls that reached the store
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Snapshot of one hash, for assertions
    pub fn snapshot(&self, key: &str) -> HashMap<String, String> {
        self.data
            .get(key)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    /// All keys currently present
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> KvResult<()> {
        if self.fail_on_write.swap(false, Ordering::SeqCst) {
            return Err(KvError::backend("hset", key, "injected failure"));
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        let mut entry = self.data.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        if self.fail_on_read.swap(false, Ordering::SeqCst) {
            return Err(KvError::backend("hgetall", key, "injected failure"));
        }
        Ok(self.snapshot(key))
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.data.remove(key);
        Ok(())
    }
}
