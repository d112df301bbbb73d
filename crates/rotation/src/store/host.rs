use async_trait::async_trait;
use rotor_hostsvc::{CheckpointToken, HostService, HostServiceClient};
use std::sync::Arc;

use super::BackingStore;
use crate::error::StoreResult;

/// A change that can be rendered as a host service `set` payload.
pub trait HostPayload {
    fn payload(&self) -> String;
}

/// State held by a host service daemon, checkpointed on the daemon itself.
#[derive(Debug, Clone)]
pub struct HostServiceStore {
    client: Arc<HostServiceClient>,
    service: HostService,
}

impl HostServiceStore {
    pub fn new(client: Arc<HostServiceClient>, service: HostService) -> Self {
        Self { client, service }
    }

    pub fn service(&self) -> HostService {
        self.service
    }
}

#[async_trait]
impl<C> BackingStore<C> for HostServiceStore
where
    C: HostPayload + Send + Sync,
{
    type Token = CheckpointToken;

    async fn checkpoint(&self) -> StoreResult<CheckpointToken> {
        let token = self.client.create_checkpoint(self.service).await?;
        tracing::debug!(service = %self.service, checkpoint = %token, "host checkpoint created");
        Ok(token)
    }

    async fn apply(&self, change: &C) -> StoreResult<()> {
        let payload = change.payload();
        tracing::debug!(service = %self.service, payload_len = payload.len(), "applying host config");
        self.client.set(self.service, &payload).await?;
        Ok(())
    }

    async fn commit(&self, token: &CheckpointToken) -> StoreResult<()> {
        self.client.delete_checkpoint(token).await?;
        Ok(())
    }

    async fn rollback(&self, token: &CheckpointToken) -> StoreResult<()> {
        self.client.restore_checkpoint(token).await?;
        Ok(())
    }
}
