use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::KvResult;

/// Hash-map store keyed by string.
///
/// `hset` must upsert all given fields of one key atomically: concurrent
/// writers may interleave whole calls but never individual fields.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Upsert fields of a hash, creating it if absent.
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> KvResult<()>;

    /// All fields of a hash; empty if the key is absent.
    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>>;

    /// Remove a hash. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> KvResult<()>;
}
