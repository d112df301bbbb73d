//! A commit that fails puts the real stores back the way rollback would.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rotor_core::{Code, FreshnessRecord, SigningConfigRecord};
use rotor_hostsvc::testing::FakeHostService;
use rotor_hostsvc::{HostAction, HostService, HostServiceClient};
use rotor_rotation::engine::Engine;
use rotor_rotation::error::{StoreError, StoreResult};
use rotor_rotation::guard::GuardRegistry;
use rotor_rotation::ledger::{FreshnessLedger, SigningConfigLedger};
use rotor_rotation::messages::{
    GlomeRequest, RotateAuthzRequest, RotateAuthzResponse,
    RotateHostParametersRequest as HostRequest, RotateHostParametersResponse as HostResponse,
};
use rotor_rotation::protocol::{AuthzProtocol, GlomeProtocol};
use rotor_rotation::store::{BackingStore, FilePolicyStore, SigningConfigStore};
use rotor_rotation::testing::{MemoryLedger, rotate_call};
use rotor_statedb::MemoryKvStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Delegates everything except `commit`, which always fails.
#[derive(Debug)]
struct CommitFails<S>(S);

#[async_trait]
impl<C, S> BackingStore<C> for CommitFails<S>
where
    C: Send + Sync,
    S: BackingStore<C>,
{
    type Token = S::Token;

    async fn checkpoint(&self) -> StoreResult<S::Token> {
        self.0.checkpoint().await
    }

    async fn apply(&self, change: &C) -> StoreResult<()> {
        self.0.apply(change).await
    }

    async fn commit(&self, _token: &S::Token) -> StoreResult<()> {
        Err(StoreError::Io {
            operation: "commit",
            path: PathBuf::from("/keys"),
            source: std::io::Error::other("disk full"),
        })
    }

    async fn rollback(&self, token: &S::Token) -> StoreResult<()> {
        self.0.rollback(token).await
    }
}

#[tokio::test]
async fn policy_file_is_restored_when_commit_fails() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authz_policy.json");
    std::fs::write(&path, r#"{"old":true}"#).unwrap();
    let files = FilePolicyStore::authz(&path);
    let backup = files.backup_path().to_path_buf();
    let ledger = MemoryLedger::<FreshnessRecord>::new();
    let engine = Engine::new(
        AuthzProtocol,
        CommitFails(files),
        Arc::new(ledger.clone()),
        GuardRegistry::new(),
    );

    let (mut stream, client) = rotate_call::<RotateAuthzRequest, RotateAuthzResponse>();
    client.send(RotateAuthzRequest::upload("v1", 1, r#"{"a":"b1"}"#)).await;
    client.send(RotateAuthzRequest::finalize()).await;
    let status = engine.run(&mut stream, None).await.unwrap_err();

    assert_eq!(status.code(), Code::Aborted);
    assert!(status.message().contains("disk full"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"old":true}"#);
    assert!(!backup.exists());
    assert!(ledger.current().is_unknown());
}

#[tokio::test]
async fn signing_config_is_restored_when_commit_fails() {
    let _log = rotor_log::init_test();
    let fake = Arc::new(FakeHostService::new());
    fake.seed(HostService::Glome, vec!["committed".into()]);
    let kv = MemoryKvStore::new();
    let ledger = SigningConfigLedger::new(Arc::new(kv.clone()));
    ledger
        .save(&SigningConfigRecord {
            enabled: true,
            key_version: 1,
            last_updated: 5,
        })
        .await
        .unwrap();
    let before = kv.snapshot("CREDENTIALS|GLOME_CONFIG");

    let client = Arc::new(HostServiceClient::new(fake.clone()));
    let engine = Engine::new(
        GlomeProtocol,
        CommitFails(SigningConfigStore::new(client, ledger.clone())),
        Arc::new(ledger),
        GuardRegistry::new(),
    );

    let (mut stream, client) = rotate_call::<HostRequest, HostResponse>();
    client
        .send(HostRequest::Glome(GlomeRequest {
            enabled: true,
            key: "k2".into(),
            key_version: 2,
            url_prefix: "https://glome.example/".into(),
        }))
        .await;
    client.send(HostRequest::Finalize).await;
    let status = engine.run(&mut stream, None).await.unwrap_err();

    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(
        fake.actions(HostService::Glome),
        vec![HostAction::PushConfig, HostAction::RestoreCheckpoint]
    );
    assert_eq!(fake.state(HostService::Glome), vec!["committed".to_string()]);
    assert_eq!(kv.snapshot("CREDENTIALS|GLOME_CONFIG"), before);
}
