use crate::{
    error::{DatabaseError, DatabaseResult},
    models::{ConfigKey, ConfigVersion},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub mod postgres;

/// Append-only store of configuration versions.
///
/// Every write is atomic: it either records exactly one new version at
/// `head + 1` or leaves the store untouched. Versions are never modified
/// or removed.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Create the logical record if needed and append a new version.
    async fn create_or_update(
        &self,
        key: &ConfigKey,
        data: Value,
        schema: Value,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion>;

    /// Highest-numbered version, or `None` when the key was never written.
    async fn get_latest(&self, key: &ConfigKey) -> DatabaseResult<Option<ConfigVersion>>;

    /// Append a copy of `target_version`'s content as a new version.
    async fn rollback(
        &self,
        key: &ConfigKey,
        target_version: i32,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion>;

    /// A specific historical version
    async fn get_version(
        &self,
        key: &ConfigKey,
        version: i32,
    ) -> DatabaseResult<Option<ConfigVersion>>;

    /// Full history, oldest first. Empty when the key was never written.
    async fn list_versions(&self, key: &ConfigKey) -> DatabaseResult<Vec<ConfigVersion>>;

    /// Whether the backend can currently serve requests
    async fn is_healthy(&self) -> bool;
}

pub(crate) fn next_version(head: i32) -> DatabaseResult<i32> {
    head.checked_add(1)
        .ok_or_else(|| DatabaseError::QueryFailed("version counter overflow".to_string()))
}

#[derive(Debug, Clone)]
struct VersionEntry {
    version: i32,
    data: Value,
    schema: Value,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ConfigRecord {
    id: i64,
    updated_at: DateTime<Utc>,
    versions: Vec<VersionEntry>,
}

impl ConfigRecord {
    fn new(id: i64) -> Self {
        Self {
            id,
            updated_at: Utc::now(),
            versions: Vec::new(),
        }
    }

    fn head(&self) -> i32 {
        self.versions.last().map_or(0, |v| v.version)
    }

    fn append(
        &mut self,
        key: &ConfigKey,
        data: Value,
        schema: Value,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion> {
        let version = next_version(self.head())?;
        let now = Utc::now();
        let entry = VersionEntry {
            version,
            data,
            schema,
            created_by: actor.to_string(),
            created_at: now,
        };
        self.updated_at = now;
        let snapshot = self.snapshot(key, &entry);
        self.versions.push(entry);
        Ok(snapshot)
    }

    fn find(&self, version: i32) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    fn snapshot(&self, key: &ConfigKey, entry: &VersionEntry) -> ConfigVersion {
        ConfigVersion {
            id: self.id,
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
            version: entry.version,
            data: entry.data.clone(),
            schema: entry.schema.clone(),
            created_by: entry.created_by.clone(),
            created_at: entry.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// In-memory config store for testing and development.
///
/// Each composite key gets its own mutex, so writers to one key are
/// serialised while writers to different keys proceed independently.
pub struct InMemoryConfigStore {
    records: DashMap<ConfigKey, Arc<Mutex<ConfigRecord>>>,
    next_id: AtomicI64,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    fn record(&self, key: &ConfigKey) -> Option<Arc<Mutex<ConfigRecord>>> {
        self.records.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn record_or_create(&self, key: &ConfigKey) -> Arc<Mutex<ConfigRecord>> {
        let entry = self.records.entry(key.clone()).or_insert_with(|| {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            Arc::new(Mutex::new(ConfigRecord::new(id)))
        });
        Arc::clone(entry.value())
    }
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn create_or_update(
        &self,
        key: &ConfigKey,
        data: Value,
        schema: Value,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion> {
        let record = self.record_or_create(key);
        let mut record = record.lock();
        let created = record.append(key, data, schema, actor)?;

        info!(config = %key, version = created.version, actor, "Config version recorded");
        Ok(created)
    }

    async fn get_latest(&self, key: &ConfigKey) -> DatabaseResult<Option<ConfigVersion>> {
        let Some(record) = self.record(key) else {
            return Ok(None);
        };
        let record = record.lock();
        Ok(record.versions.last().map(|entry| record.snapshot(key, entry)))
    }

    async fn rollback(
        &self,
        key: &ConfigKey,
        target_version: i32,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion> {
        let record = self.record(key).ok_or_else(|| DatabaseError::ConfigNotFound {
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
        })?;
        let mut record = record.lock();

        let target = record
            .find(target_version)
            .cloned()
            .ok_or_else(|| DatabaseError::VersionNotFound {
                key: key.key.clone(),
                version: target_version,
            })?;

        debug!(config = %key, target_version, head = record.head(), "Replaying version content");
        let restored = record.append(key, target.data, target.schema, actor)?;

        info!(
            config = %key,
            target_version,
            version = restored.version,
            actor,
            "Config rolled back"
        );
        Ok(restored)
    }

    async fn get_version(
        &self,
        key: &ConfigKey,
        version: i32,
    ) -> DatabaseResult<Option<ConfigVersion>> {
        let Some(record) = self.record(key) else {
            return Ok(None);
        };
        let record = record.lock();
        Ok(record.find(version).map(|entry| record.snapshot(key, entry)))
    }

    async fn list_versions(&self, key: &ConfigKey) -> DatabaseResult<Vec<ConfigVersion>> {
        let Some(record) = self.record(key) else {
            return Ok(Vec::new());
        };
        let record = record.lock();
        Ok(record
            .versions
            .iter()
            .map(|entry| record.snapshot(key, entry))
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flags() -> ConfigKey {
        ConfigKey::new(1, 1, "feature_flags")
    }

    #[tokio::test]
    async fn test_first_write_starts_at_version_one() {
        let store = InMemoryConfigStore::new();

        let created = store
            .create_or_update(&flags(), json!({"a": 1}), json!({"version": 1}), "alice")
            .await
            .unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.created_by, "alice");
        assert_eq!(created.key, "feature_flags");
    }

    #[tokio::test]
    async fn test_get_latest_unknown_key_is_none() {
        let store = InMemoryConfigStore::new();
        assert!(store.get_latest(&flags()).await.unwrap().is_none());
        assert!(store.list_versions(&flags()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rollback_missing_key_and_version_are_distinct() {
        let store = InMemoryConfigStore::new();

        let err = store.rollback(&flags(), 1, "bob").await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigNotFound { .. }));

        store
            .create_or_update(&flags(), json!({}), json!({}), "alice")
            .await
            .unwrap();
        let err = store.rollback(&flags(), 9, "bob").await.unwrap_err();
        assert!(matches!(err, DatabaseError::VersionNotFound { version: 9, .. }));

        // Failed rollbacks leave history untouched
        assert_eq!(store.list_versions(&flags()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = InMemoryConfigStore::new();
        let prod = ConfigKey::new(1, 2, "feature_flags");

        store.create_or_update(&flags(), json!({}), json!({}), "a").await.unwrap();
        store.create_or_update(&flags(), json!({}), json!({}), "a").await.unwrap();
        let first_prod = store.create_or_update(&prod, json!({}), json!({}), "a").await.unwrap();

        assert_eq!(first_prod.version, 1);
        assert_ne!(
            first_prod.id,
            store.get_latest(&flags()).await.unwrap().unwrap().id
        );
    }
}
