use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;

use crate::error::{KvError, KvResult};
use crate::store::KvStore;

/// [`KvStore`] over the switch's Redis state DB.
///
/// `HSET key f1 v1 f2 v2 ...` is a single command, so multi-field upserts
/// are atomic on the server.
#[derive(Clone)]
pub struct RedisKvStore {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvStore").finish_non_exhaustive()
    }
}

impl RedisKvStore {
    /// Connect to `redis://host:port/db` or a `unix://` socket path.
    pub async fn connect(url: &str) -> KvResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| KvError::Unavailable(format!("{url}: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| KvError::Unavailable(format!("{url}: {e}")))?;
        tracing::info!(url = %url, "connected to state db");
        Ok(Self { manager })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn hset(&self, key: &str, fields: &[(String, String)]) -> KvResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| KvError::backend("hset", key, e.to_string()))
    }

    async fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let mut conn = self.manager.clone();
        redis::cmd("HGETALL")
            .arg(key)
            .query_async::<HashMap<String, String>>(&mut conn)
            .await
            .map_err(|e| KvError::backend("hgetall", key, e.to_string()))
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        let mut conn = self.manager.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| KvError::backend("del", key, e.to_string()))
    }
}
