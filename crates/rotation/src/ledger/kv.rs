use async_trait::async_trait;
use rotor_core::SigningConfigRecord;
use rotor_statedb::{KvStore, StateKey};
use std::sync::Arc;

use super::FreshnessLedger;
use crate::error::LedgerResult;

/// State-DB table holding the GLOME record.
pub const GLOME_CONFIG_TABLE: &str = "GLOME_CONFIG";

/// GLOME metadata kept as one hash in the replicated state DB.
///
/// Each save is a single multi-field `hset`, so concurrent writers can only
/// interleave whole records.
#[derive(Clone)]
pub struct SigningConfigLedger {
    kv: Arc<dyn KvStore>,
    key: StateKey,
}

impl std::fmt::Debug for SigningConfigLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfigLedger")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SigningConfigLedger {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            key: StateKey::new(GLOME_CONFIG_TABLE),
        }
    }

    pub fn key(&self) -> &StateKey {
        &self.key
    }

    /// Load the record, publishing the default when the state DB has none.
    ///
    /// After this every rollback rewrites a record that was already there,
    /// so an aborted session leaves the hash as it found it. Failing to
    /// publish the default is only logged: an empty hash reads as the
    /// default anyway.
    pub async fn init(&self) -> LedgerResult<SigningConfigRecord> {
        let fields = self.kv.hgetall(self.key.as_str()).await?;
        if !fields.is_empty() {
            return Ok(SigningConfigRecord::from_fields(&fields)?);
        }

        let record = SigningConfigRecord::default();
        if let Err(e) = self.save(&record).await {
            tracing::warn!(key = %self.key, error = %e, "failed to publish default signing config");
        }
        Ok(record)
    }
}

#[async_trait]
impl FreshnessLedger<SigningConfigRecord> for SigningConfigLedger {
    async fn load(&self) -> LedgerResult<SigningConfigRecord> {
        let fields = self.kv.hgetall(self.key.as_str()).await?;
        if fields.is_empty() {
            return Ok(SigningConfigRecord::default());
        }
        Ok(SigningConfigRecord::from_fields(&fields)?)
    }

    async fn save(&self, record: &SigningConfigRecord) -> LedgerResult<()> {
        self.kv.hset(self.key.as_str(), &record.to_fields()).await?;
        tracing::debug!(key = %self.key, enabled = record.enabled, key_version = record.key_version, "signing config saved");
        Ok(())
    }
}
