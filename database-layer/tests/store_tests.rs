//! Versioned store behaviour over the in-memory backend
//!
//! Covers the history guarantees every backend must honour:
//! 1. Write, write, rollback round trip with untouched history
//! 2. Repeated reads without writes are identical
//! 3. Gap-free version numbers under concurrent writers
//! 4. Writers to different keys do not share a counter

use database_layer::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn checkout_flags() -> ConfigKey {
    ConfigKey::new(1, 1, "checkout_flags")
}

#[tokio::test]
async fn test_round_trip_with_rollback_preserves_history() {
    let store = InMemoryConfigStore::new();
    let key = checkout_flags();
    let schema = json!({"version": 1, "rules": {"beta": {"type": "bool"}}});

    let v1 = store
        .create_or_update(&key, json!({"beta": false}), schema.clone(), "alice")
        .await
        .unwrap();
    let v2 = store
        .create_or_update(&key, json!({"beta": true}), schema.clone(), "alice")
        .await
        .unwrap();

    let latest = store.get_latest(&key).await.unwrap().unwrap();
    assert_eq!(latest.version, 2);
    assert_eq!(latest.data, json!({"beta": true}));

    let v3 = store.rollback(&key, 1, "bob").await.unwrap();
    assert_eq!(v3.version, 3);
    assert!(v3.same_content(&v1));
    assert_eq!(v3.created_by, "bob");

    // Versions 1 and 2 are still there with their original content
    let stored_v1 = store.get_version(&key, 1).await.unwrap().unwrap();
    assert!(stored_v1.same_content(&v1));
    assert_eq!(stored_v1.created_by, "alice");
    assert_eq!(stored_v1.created_at, v1.created_at);
    let stored_v2 = store.get_version(&key, 2).await.unwrap().unwrap();
    assert_eq!(stored_v2.version, v2.version);
    assert_eq!(stored_v2.data, v2.data);
    assert_eq!(stored_v2.created_by, "alice");

    let history: Vec<i32> = store
        .list_versions(&key)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version)
        .collect();
    assert_eq!(history, vec![1, 2, 3]);
    assert_eq!(store.get_latest(&key).await.unwrap().unwrap().version, 3);
}

#[tokio::test]
async fn test_get_latest_is_idempotent() {
    let store = InMemoryConfigStore::new();
    let key = checkout_flags();
    store
        .create_or_update(&key, json!({"limit": 10}), json!({}), "alice")
        .await
        .unwrap();

    let first = store.get_latest(&key).await.unwrap();
    let second = store.get_latest(&key).await.unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rollback_to_missing_version_names_the_version() {
    let store = InMemoryConfigStore::new();
    let key = checkout_flags();
    store
        .create_or_update(&key, json!({}), json!({}), "alice")
        .await
        .unwrap();

    let err = store.rollback(&key, 42, "bob").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("target version 42 not found"));

    let other = ConfigKey::new(1, 1, "never_written");
    let err = store.rollback(&other, 1, "bob").await.unwrap_err();
    assert!(matches!(err, DatabaseError::ConfigNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_get_gap_free_versions() {
    const WRITERS: i32 = 32;

    let store = Arc::new(InMemoryConfigStore::new());
    let key = checkout_flags();

    // Start from an existing head so the range is V+1..V+N
    for i in 0..3 {
        store
            .create_or_update(&key, json!({"seed": i}), json!({}), "seed")
            .await
            .unwrap();
    }
    let head = store.get_latest(&key).await.unwrap().unwrap().version;

    let mut handles = Vec::new();
    for i in 0..WRITERS {
        let store = Arc::clone(&store);
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_or_update(&key, json!({"writer": i}), json!({}), &format!("writer-{i}"))
                .await
                .unwrap()
                .version
        }));
    }

    let mut seen = BTreeSet::new();
    for handle in handles {
        let version = handle.await.unwrap();
        assert!(seen.insert(version), "version {version} assigned twice");
    }

    let expected: BTreeSet<i32> = (head + 1..=head + WRITERS).collect();
    assert_eq!(seen, expected);

    let history = store.list_versions(&key).await.unwrap();
    assert_eq!(history.len(), (head + WRITERS) as usize);
    assert!(history.windows(2).all(|w| w[1].version == w[0].version + 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_keys_keep_independent_counters() {
    let store = Arc::new(InMemoryConfigStore::new());

    let mut handles = Vec::new();
    for env_id in 1..=4_i64 {
        for _ in 0..5 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let key = ConfigKey::new(1, env_id, "limits");
                store
                    .create_or_update(&key, json!({"env": env_id}), json!({}), "ci")
                    .await
                    .unwrap();
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for env_id in 1..=4_i64 {
        let key = ConfigKey::new(1, env_id, "limits");
        let latest = store.get_latest(&key).await.unwrap().unwrap();
        assert_eq!(latest.version, 5);
        assert_eq!(latest.env_id, env_id);
    }
}
