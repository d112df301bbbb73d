use rotor_statedb::{KvStore, MemoryKvStore, StateKey};
use std::sync::Arc;

fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(f, v)| ((*f).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn hset_upserts_fields() {
    let store = MemoryKvStore::new();
    let key = StateKey::new("SSH_HOST");

    store
        .hset(key.as_str(), &fields(&[("ca_keys_version", "v1"), ("ca_keys_created_on", "1")]))
        .await
        .unwrap();
    store
        .hset(key.as_str(), &fields(&[("ca_keys_version", "v2")]))
        .await
        .unwrap();

    let stored = store.hgetall(key.as_str()).await.unwrap();
    assert_eq!(stored["ca_keys_version"], "v2");
    assert_eq!(stored["ca_keys_created_on"], "1");
}

#[tokio::test]
async fn absent_key_reads_empty() {
    let store = MemoryKvStore::new();
    assert!(store.hgetall("CREDENTIALS|NOPE").await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_identical_writes_both_succeed() {
    let store = Arc::new(MemoryKvStore::new());
    let key = StateKey::new("GLOME_CONFIG").to_string();
    let record = fields(&[("enabled", "true"), ("key_version", "3"), ("last_updated", "42")]);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let key = key.clone();
        let record = record.clone();
        handles.push(tokio::spawn(async move { store.hset(&key, &record).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = store.hgetall(&key).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored["key_version"], "3");
    assert_eq!(store.write_count(), 8);
}

#[tokio::test]
async fn injected_failures_fire_once() {
    let store = MemoryKvStore::new();
    store.fail_next_write();
    assert!(store.hset("k", &fields(&[("a", "1")])).await.is_err());
    assert!(store.hset("k", &fields(&[("a", "1")])).await.is_ok());

    store.fail_next_read();
    assert!(store.hgetall("k").await.is_err());
    assert_eq!(store.hgetall("k").await.unwrap()["a"], "1");
}
