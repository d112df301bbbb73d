use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::caller::HostServiceCaller;
use crate::error::{HostServiceError, HostServiceResult};
use crate::method::{HostAction, HostMethod, HostService};
use crate::metrics::HostServiceMetrics;

/// Timeouts applied to host service calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for every call except the untracked restore.
    pub call_timeout: Duration,
    /// Deadline for [`HostServiceClient::restore_untracked`]; rolling the
    /// GLOME config back can take the daemon minutes.
    pub restore_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            restore_timeout: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.restore_timeout = timeout;
        self
    }
}

/// Handle to a checkpoint created through [`HostServiceClient::create_checkpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointToken {
    service: HostService,
    id: Uuid,
}

impl CheckpointToken {
    pub fn service(&self) -> HostService {
        self.service
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for CheckpointToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.id)
    }
}

/// Typed client over a [`HostServiceCaller`].
///
/// The daemon keeps a single checkpoint slot per service. The client mirrors
/// that slot locally so a second `create_checkpoint` for a service fails
/// before it reaches the daemon instead of silently replacing the first
/// one. Share one client (behind an `Arc`) between every store that talks
/// to the same daemon.
pub struct HostServiceClient {
    caller: Arc<dyn HostServiceCaller>,
    config: ClientConfig,
    outstanding: DashMap<HostService, Uuid>,
    metrics: Arc<HostServiceMetrics>,
}

impl fmt::Debug for HostServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServiceClient")
            .field("config", &self.config)
            .field("outstanding", &self.outstanding.len())
            .finish_non_exhaustive()
    }
}

impl HostServiceClient {
    pub fn new(caller: Arc<dyn HostServiceCaller>) -> Self {
        Self::with_config(caller, ClientConfig::default())
    }

    pub fn with_config(caller: Arc<dyn HostServiceCaller>, config: ClientConfig) -> Self {
        Self {
            caller,
            config,
            outstanding: DashMap::new(),
            metrics: Arc::new(HostServiceMetrics::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<HostServiceMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Whether a checkpoint is currently held for `service`.
    pub fn has_checkpoint(&self, service: HostService) -> bool {
        self.outstanding.contains_key(&service)
    }

    /// Issue one call with a deadline, recording counters.
    pub async fn invoke(
        &self,
        method: HostMethod,
        payload: &str,
        timeout: Duration,
    ) -> HostServiceResult<String> {
        let started = Instant::now();
        tracing::debug!(method = %method, payload_len = payload.len(), "host service call");

        match tokio::time::timeout(timeout, self.caller.call(&method, payload)).await {
            Ok(Ok(reply)) => {
                self.metrics
                    .record_call(method.action, started.elapsed(), true);
                Ok(reply)
            }
            Ok(Err(e)) => {
                self.metrics
                    .record_call(method.action, started.elapsed(), false);
                tracing::warn!(method = %method, error = %e, "host service call failed");
                Err(e)
            }
            Err(_) => {
                self.metrics.record_timeout(method.action, timeout);
                tracing::warn!(method = %method, timeout = ?timeout, "host service call timed out");
                Err(HostServiceError::Timeout {
                    method: method.name(),
                    after: timeout,
                })
            }
        }
    }

    /// Snapshot the service's current configuration on the daemon.
    ///
    /// Fails with [`HostServiceError::CheckpointOutstanding`] if this client
    /// already holds a checkpoint for the service.
    pub async fn create_checkpoint(
        &self,
        service: HostService,
    ) -> HostServiceResult<CheckpointToken> {
        let id = Uuid::new_v4();
        match self.outstanding.entry(service) {
            Entry::Occupied(_) => {
                tracing::error!(service = %service, "refusing to overwrite outstanding checkpoint");
                return Err(HostServiceError::CheckpointOutstanding { service });
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let method = HostMethod::new(service, HostAction::CreateCheckpoint);
        if let Err(e) = self.invoke(method, "", self.config.call_timeout).await {
            self.outstanding.remove_if(&service, |_, held| *held == id);
            return Err(e);
        }
        Ok(CheckpointToken { service, id })
    }

    /// Discard the checkpoint, keeping the applied configuration.
    pub async fn delete_checkpoint(&self, token: &CheckpointToken) -> HostServiceResult<()> {
        self.finish_checkpoint(token, HostAction::DeleteCheckpoint)
            .await
    }

    /// Restore the configuration saved by the checkpoint and discard it.
    pub async fn restore_checkpoint(&self, token: &CheckpointToken) -> HostServiceResult<()> {
        self.finish_checkpoint(token, HostAction::RestoreCheckpoint)
            .await
    }

    /// Apply a configuration blob.
    pub async fn set(&self, service: HostService, payload: &str) -> HostServiceResult<()> {
        let method = HostMethod::new(service, HostAction::Set);
        self.invoke(method, payload, self.config.call_timeout)
            .await
            .map(|_| ())
    }

    /// Push a complete configuration document. The daemon checkpoints the
    /// previous document itself.
    pub async fn push_config(&self, service: HostService, payload: &str) -> HostServiceResult<()> {
        let method = HostMethod::new(service, HostAction::PushConfig);
        self.invoke(method, payload, self.config.call_timeout)
            .await
            .map(|_| ())
    }

    /// Restore a checkpoint the daemon took on its own during `push_config`.
    pub async fn restore_untracked(&self, service: HostService) -> HostServiceResult<()> {
        let method = HostMethod::new(service, HostAction::RestoreCheckpoint);
        self.invoke(method, "", self.config.restore_timeout)
            .await
            .map(|_| ())
    }

    async fn finish_checkpoint(
        &self,
        token: &CheckpointToken,
        action: HostAction,
    ) -> HostServiceResult<()> {
        let held = self.outstanding.get(&token.service).map(|id| *id);
        if held != Some(token.id) {
            return Err(HostServiceError::UnknownCheckpoint {
                service: token.service,
                token: token.to_string(),
            });
        }

        let method = HostMethod::new(token.service, action);
        let result = self.invoke(method, "", self.config.call_timeout).await;
        // A failed delete leaves the daemon's checkpoint in place, so keep
        // the slot for the restore that follows. A restore is attempted
        // once only.
        if result.is_ok() || action == HostAction::RestoreCheckpoint {
            self.outstanding
                .remove_if(&token.service, |_, id| *id == token.id);
        }
        result.map(|_| ())
    }
}
