use async_trait::async_trait;
use rotor_core::SigningConfigRecord;
use rotor_hostsvc::{HostService, HostServiceClient};
use std::sync::Arc;

use super::BackingStore;
use crate::error::{StoreError, StoreResult};
use crate::ledger::{FreshnessLedger, SigningConfigLedger};
use crate::messages::GlomeRequest;

/// GLOME configuration.
///
/// The daemon checkpoints the previous config itself on `push_config`, so
/// this store's own checkpoint is only the state-DB record.
#[derive(Debug, Clone)]
pub struct SigningConfigStore {
    client: Arc<HostServiceClient>,
    ledger: SigningConfigLedger,
}

impl SigningConfigStore {
    pub fn new(client: Arc<HostServiceClient>, ledger: SigningConfigLedger) -> Self {
        Self { client, ledger }
    }
}

#[async_trait]
impl BackingStore<GlomeRequest> for SigningConfigStore {
    type Token = SigningConfigRecord;

    async fn checkpoint(&self) -> StoreResult<SigningConfigRecord> {
        Ok(self.ledger.load().await?)
    }

    async fn apply(&self, change: &GlomeRequest) -> StoreResult<()> {
        let payload = serde_json::to_string(change).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.client.push_config(HostService::Glome, &payload).await?;
        Ok(())
    }

    async fn commit(&self, _token: &SigningConfigRecord) -> StoreResult<()> {
        Ok(())
    }

    async fn rollback(&self, token: &SigningConfigRecord) -> StoreResult<()> {
        self.client.restore_untracked(HostService::Glome).await?;
        self.ledger.save(token).await?;
        Ok(())
    }
}
