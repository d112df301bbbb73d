//! End-to-end authz Rotate sessions against a real policy file.

use pretty_assertions::assert_eq;
use rotor_core::{Code, FreshnessRecord, ResourceKind, Status};
use rotor_rotation::ServerConfig;
use rotor_rotation::engine::{CONCURRENT_ROTATION, NO_FINALIZE};
use rotor_rotation::messages::{RotateAuthzRequest, RotateAuthzResponse};
use rotor_rotation::stream::{ChannelStream, ClientHandle};
use rotor_rotation::testing::{DenyAll, Harness, rotate_call};
use std::path::Path;
use std::sync::Arc;

/// Ten bytes of valid JSON.
const POLICY: &str = r#"{"a":"b1"}"#;
const NEXT_POLICY: &str = r#"{"a":"b2"}"#;
const OLD_POLICY: &str = r#"{"old":true}"#;

fn call() -> (
    ChannelStream<RotateAuthzRequest, RotateAuthzResponse>,
    ClientHandle<RotateAuthzRequest, RotateAuthzResponse>,
) {
    rotate_call()
}

async fn seeded(dir: &Path) -> Harness {
    let harness = Harness::start(dir).await.unwrap();
    std::fs::write(&harness.config.authz_policy_file, OLD_POLICY).unwrap();
    harness
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn backup(config: &ServerConfig) -> std::path::PathBuf {
    let mut path = config.authz_policy_file.clone().into_os_string();
    path.push(".bak");
    path.into()
}

fn ledger(config: &ServerConfig) -> FreshnessRecord {
    serde_json::from_str(&read(&config.authz_meta_file)).unwrap()
}

async fn rotate(harness: &Harness, requests: Vec<RotateAuthzRequest>) -> Result<(), Status> {
    let (mut stream, mut client) = call();
    for request in requests {
        assert!(client.send(request).await);
    }
    client.close_send();
    harness.server.authz().rotate(&mut stream).await
}

#[tokio::test]
async fn upload_and_finalize_commits_policy_and_freshness() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    let (mut stream, mut client) = call();
    client.send(RotateAuthzRequest::upload("v1", 123, POLICY)).await;
    client.send(RotateAuthzRequest::finalize()).await;
    h.server.authz().rotate(&mut stream).await.unwrap();
    drop(stream);

    assert_eq!(client.recv().await, Some(RotateAuthzResponse::default()));
    assert_eq!(client.recv().await, None);

    assert_eq!(read(&h.config.authz_policy_file), POLICY);
    assert!(!backup(&h.config).exists());
    assert_eq!(ledger(&h.config), FreshnessRecord::new("v1", 123));

    for key in ["CREDENTIALS|AUTHZ_POLICY|gnxi", "CREDENTIALS|AUTHZ_POLICY|p4rt"] {
        let fields = h.kv.snapshot(key);
        assert_eq!(fields["authz_version"], "v1");
        assert_eq!(fields["authz_created_on"], "123");
    }
    assert!(!h.server.guards().is_held(ResourceKind::AuthzPolicy));
}

#[tokio::test]
async fn closing_without_finalize_restores_policy() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    let (mut stream, mut client) = call();
    client.send(RotateAuthzRequest::upload("v1", 123, POLICY)).await;
    client.close_send();
    let status = h.server.authz().rotate(&mut stream).await.unwrap_err();
    drop(stream);

    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(status.message(), NO_FINALIZE);
    // The upload was acknowledged before the stream ended.
    assert_eq!(client.recv().await, Some(RotateAuthzResponse::default()));

    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
    assert!(!backup(&h.config).exists());
    assert!(!h.config.authz_meta_file.exists());
    assert_eq!(h.kv.snapshot("CREDENTIALS|AUTHZ_POLICY|gnxi")["authz_version"], "unknown");
}

#[tokio::test]
async fn missing_policy_file_is_not_found() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(dir.path()).await.unwrap();

    let status = rotate(
        &h,
        vec![RotateAuthzRequest::upload("v1", 123, POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap_err();

    assert_eq!(status.code(), Code::NotFound);
    assert!(status.message().ends_with("Please try Install."));
    assert!(!h.config.authz_policy_file.exists());
    assert!(!backup(&h.config).exists());
    assert!(!h.config.authz_meta_file.exists());
    assert!(!h.server.guards().is_held(ResourceKind::AuthzPolicy));
}

#[tokio::test]
async fn backup_left_by_a_crash_is_recovered_on_restart() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig::rooted_at(dir.path());
    std::fs::write(&config.authz_policy_file, NEXT_POLICY).unwrap();
    std::fs::write(backup(&config), OLD_POLICY).unwrap();

    let h = Harness::start(dir.path()).await.unwrap();
    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
    assert!(!backup(&h.config).exists());

    rotate(
        &h,
        vec![RotateAuthzRequest::upload("v1", 1, POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap();
    assert_eq!(read(&h.config.authz_policy_file), POLICY);
}

#[tokio::test]
async fn second_session_is_refused_while_first_is_open() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;
    let authz = h.server.authz();

    let (mut first, mut first_client) = call();
    first_client.send(RotateAuthzRequest::upload("v1", 1, POLICY)).await;

    let (mut second, mut second_client) = call();
    second_client.send(RotateAuthzRequest::upload("v2", 2, NEXT_POLICY)).await;
    second_client.close_send();

    let (first_result, second_result) = tokio::join!(authz.rotate(&mut first), async {
        // The ack means the first session holds the guard and has staged.
        first_client.recv().await.unwrap();
        let result = authz.rotate(&mut second).await;
        first_client.send(RotateAuthzRequest::finalize()).await;
        result
    });

    first_result.unwrap();
    let status = second_result.unwrap_err();
    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(status.message(), CONCURRENT_ROTATION);

    assert_eq!(read(&h.config.authz_policy_file), POLICY);
    assert_eq!(ledger(&h.config), FreshnessRecord::new("v1", 1));
}

#[tokio::test]
async fn committed_version_is_refused_unless_forced() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    rotate(
        &h,
        vec![RotateAuthzRequest::upload("v1", 1, POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap();

    let status = rotate(
        &h,
        vec![RotateAuthzRequest::upload("v1", 2, NEXT_POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), "Authz with version `v1` already exists");
    assert_eq!(read(&h.config.authz_policy_file), POLICY);
    assert!(!backup(&h.config).exists());

    rotate(
        &h,
        vec![
            RotateAuthzRequest::upload("v1", 2, NEXT_POLICY).forced(),
            RotateAuthzRequest::finalize(),
        ],
    )
    .await
    .unwrap();
    assert_eq!(read(&h.config.authz_policy_file), NEXT_POLICY);
    assert_eq!(ledger(&h.config), FreshnessRecord::new("v1", 2));
}

#[tokio::test]
async fn malformed_policy_aborts_and_next_session_succeeds() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    let status = rotate(
        &h,
        vec![
            RotateAuthzRequest::upload("v1", 1, POLICY),
            RotateAuthzRequest::upload("v2", 2, "not json"),
            RotateAuthzRequest::finalize(),
        ],
    )
    .await
    .unwrap_err();
    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(status.message(), "Authz policy `not json` is malformed");
    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);

    rotate(
        &h,
        vec![RotateAuthzRequest::upload("v2", 2, NEXT_POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap();
    assert_eq!(read(&h.config.authz_policy_file), NEXT_POLICY);
}

#[tokio::test]
async fn bare_finalize_changes_nothing() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    rotate(&h, vec![RotateAuthzRequest::finalize()]).await.unwrap();

    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
    assert!(!backup(&h.config).exists());
    assert!(!h.config.authz_meta_file.exists());
}

#[tokio::test]
async fn failed_ack_rolls_back() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    let (mut stream, mut client) = call();
    client.send(RotateAuthzRequest::upload("v1", 1, POLICY)).await;
    client.send(RotateAuthzRequest::finalize()).await;
    client.close_recv();

    let status = h.server.authz().rotate(&mut stream).await.unwrap_err();

    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
    assert!(!h.config.authz_meta_file.exists());
}

#[tokio::test]
async fn transport_error_rolls_back() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = seeded(dir.path()).await;

    let (mut stream, client) = call();
    client.send(RotateAuthzRequest::upload("v1", 1, POLICY)).await;
    client.fail(Status::cancelled("deadline exceeded")).await;

    let status = h.server.authz().rotate(&mut stream).await.unwrap_err();

    assert_eq!(status.code(), Code::Aborted);
    assert_eq!(status.message(), "deadline exceeded");
    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
}

#[tokio::test]
async fn unauthenticated_caller_touches_nothing() {
    let _log = rotor_log::init_test();
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start_with(ServerConfig::rooted_at(dir.path()), Arc::new(DenyAll))
        .await
        .unwrap();
    std::fs::write(&h.config.authz_policy_file, OLD_POLICY).unwrap();

    let status = rotate(
        &h,
        vec![RotateAuthzRequest::upload("v1", 1, POLICY), RotateAuthzRequest::finalize()],
    )
    .await
    .unwrap_err();

    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(read(&h.config.authz_policy_file), OLD_POLICY);
    assert!(!backup(&h.config).exists());
    assert!(!h.server.guards().is_held(ResourceKind::AuthzPolicy));
}

#[tokio::test]
async fn unary_methods_are_unimplemented() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::start(dir.path()).await.unwrap();

    let status = h.server.authz().probe(Default::default()).await.unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
    let status = h.server.authz().get(Default::default()).await.unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
}
