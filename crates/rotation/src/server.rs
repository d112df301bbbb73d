//! Assembles the services from config and collaborators.

use rotor_core::FreshnessRecord;
use rotor_hostsvc::{HostService, HostServiceCaller, HostServiceClient, HostServiceMetrics};
use rotor_pathz::PathzAuthorizer;
use rotor_statedb::KvStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::ServerError;
use crate::guard::GuardRegistry;
use crate::ledger::{
    ConsoleDocument, FileLedger, FreshnessLedger, MirroredLedger, Projection, SigningConfigLedger,
    SshAccountsDocument, SshHostDocument, projection,
};
use crate::protocol::{
    AuthzProtocol, ConsoleProtocol, GlomeProtocol, PathzProtocol, SshAccountProtocol,
    SshHostProtocol,
};
use crate::service::{AuthzService, CredentialzService, PathzService};
use crate::store::{FilePolicyStore, HostServiceStore, PathzStore, SigningConfigStore};

/// The rotation services of one device, sharing one guard registry and
/// one host service client.
pub struct RotorServer {
    config: ServerConfig,
    authz: AuthzService,
    pathz: PathzService,
    credentialz: CredentialzService,
    authorizer: Arc<PathzAuthorizer>,
    guards: GuardRegistry,
    host: Arc<HostServiceClient>,
}

impl std::fmt::Debug for RotorServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotorServer")
            .field("config", &self.config)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

impl RotorServer {
    pub fn builder() -> RotorServerBuilder {
        RotorServerBuilder::default()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn authz(&self) -> &AuthzService {
        &self.authz
    }

    pub fn pathz(&self) -> &PathzService {
        &self.pathz
    }

    pub fn credentialz(&self) -> &CredentialzService {
        &self.credentialz
    }

    /// Live pathz authorizer for the gNMI data path.
    pub fn authorizer(&self) -> &Arc<PathzAuthorizer> {
        &self.authorizer
    }

    pub fn guards(&self) -> &GuardRegistry {
        &self.guards
    }

    pub fn host_metrics(&self) -> Arc<HostServiceMetrics> {
        self.host.metrics()
    }
}

#[derive(Default)]
pub struct RotorServerBuilder {
    config: ServerConfig,
    host_service: Option<Arc<dyn HostServiceCaller>>,
    state_db: Option<Arc<dyn KvStore>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    authorizer: Option<Arc<PathzAuthorizer>>,
}

async fn mirrored_ledger<R>(
    path: &Path,
    kv: &Arc<dyn KvStore>,
    projection: Projection<R>,
) -> Result<Arc<dyn FreshnessLedger<R>>, ServerError>
where
    R: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
{
    let ledger = MirroredLedger::new(FileLedger::<R>::new(path), Arc::clone(kv), projection);
    ledger.mirror_current().await?;
    Ok(Arc::new(ledger))
}

impl RotorServerBuilder {
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host_service(mut self, caller: Arc<dyn HostServiceCaller>) -> Self {
        self.host_service = Some(caller);
        self
    }

    pub fn state_db(mut self, kv: Arc<dyn KvStore>) -> Self {
        self.state_db = Some(kv);
        self
    }

    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Share an authorizer with the gNMI server. A fresh one is created
    /// otherwise.
    pub fn pathz_authorizer(mut self, authorizer: Arc<PathzAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Recover policy files left mid-rotation, load every ledger
    /// (publishing it to the state DB) and wire the engines. A ledger that
    /// cannot be read fails the build.
    pub async fn build(self) -> Result<RotorServer, ServerError> {
        let caller = self.host_service.ok_or(ServerError::Missing("host service"))?;
        let kv = self.state_db.ok_or(ServerError::Missing("state db"))?;
        let authenticator = self
            .authenticator
            .ok_or(ServerError::Missing("authenticator"))?;
        let config = self.config;
        config.validate()?;

        let guards = GuardRegistry::new();
        let host = Arc::new(HostServiceClient::with_config(caller, config.client_config()));
        let authorizer = self.authorizer.unwrap_or_default();

        // A backup on disk means a session died before commit or rollback.
        let authz_file = FilePolicyStore::authz(&config.authz_policy_file);
        let pathz_file = FilePolicyStore::pathz(&config.pathz_policy_file);
        authz_file.recover().await?;
        pathz_file.recover().await?;

        if config.pathz_enforced {
            match authorizer.update_policy_from_file(&config.pathz_policy_file) {
                Ok(()) => tracing::info!(path = %config.pathz_policy_file.display(), "pathz policy loaded"),
                Err(e) => {
                    tracing::warn!(path = %config.pathz_policy_file.display(), error = %e, "pathz policy not loaded");
                }
            }
        }

        let authz_ledger =
            mirrored_ledger::<FreshnessRecord>(&config.authz_meta_file, &kv, projection::authz).await?;
        let pathz_ledger =
            mirrored_ledger::<FreshnessRecord>(&config.pathz_meta_file, &kv, projection::pathz).await?;
        let ssh_account_ledger = mirrored_ledger::<SshAccountsDocument>(
            &config.ssh_account_meta_file,
            &kv,
            projection::ssh_accounts,
        )
        .await?;
        let ssh_host_ledger =
            mirrored_ledger::<SshHostDocument>(&config.ssh_host_meta_file, &kv, projection::ssh_host)
                .await?;
        let console_ledger =
            mirrored_ledger::<ConsoleDocument>(&config.console_meta_file, &kv, projection::console)
                .await?;
        let glome_ledger = SigningConfigLedger::new(Arc::clone(&kv));
        glome_ledger.init().await?;

        let authz = AuthzService::new(
            Engine::new(
                AuthzProtocol,
                authz_file,
                authz_ledger,
                guards.clone(),
            ),
            Arc::clone(&authenticator),
        );

        let pathz = PathzService::new(
            Engine::new(
                PathzProtocol,
                PathzStore::new(pathz_file, Arc::clone(&authorizer)),
                pathz_ledger,
                guards.clone(),
            ),
            Arc::clone(&authenticator),
        );

        let credentialz = CredentialzService::new(
            Engine::new(
                SshAccountProtocol,
                HostServiceStore::new(Arc::clone(&host), HostService::SshMgmt),
                ssh_account_ledger,
                guards.clone(),
            ),
            Engine::new(
                ConsoleProtocol,
                HostServiceStore::new(Arc::clone(&host), HostService::GnsiConsole),
                console_ledger,
                guards.clone(),
            ),
            Engine::new(
                SshHostProtocol,
                HostServiceStore::new(Arc::clone(&host), HostService::SshMgmt),
                ssh_host_ledger,
                guards.clone(),
            ),
            Engine::new(
                GlomeProtocol,
                SigningConfigStore::new(Arc::clone(&host), glome_ledger.clone()),
                Arc::new(glome_ledger),
                guards.clone(),
            ),
            authenticator,
        );

        tracing::info!(pathz_enforced = config.pathz_enforced, "rotation services ready");
        Ok(RotorServer {
            config,
            authz,
            pathz,
            credentialz,
            authorizer,
            guards,
            host,
        })
    }
}
