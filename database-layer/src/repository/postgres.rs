//! PostgreSQL-backed config store
//!
//! Each write runs in one transaction. The row of the logical record in
//! `configs` is locked before the next version number is computed and
//! stays locked until the version insert commits, so concurrent writers
//! to one key are serialised and version numbers stay gap-free. Dropping
//! the transaction on any error rolls everything back.

use crate::{
    connection::DatabasePool,
    error::{DatabaseError, DatabaseResult},
    models::{ConfigKey, ConfigVersion},
    repository::{next_version, ConfigStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, info};

/// One `configs` row joined with one `config_versions` row
#[derive(Debug, FromRow)]
struct VersionRow {
    id: i64,
    updated_at: DateTime<Utc>,
    version: i32,
    data: Value,
    schema: Value,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl VersionRow {
    fn into_version(self, key: &ConfigKey) -> ConfigVersion {
        ConfigVersion {
            id: self.id,
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
            version: self.version,
            data: self.data,
            schema: self.schema,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_VERSIONS: &str = r#"
    SELECT c.id, c.updated_at, v.version, v.data, v.schema, v.created_by, v.created_at
    FROM configs c
    JOIN config_versions v ON v.config_id = c.id
    WHERE c.project_id = $1 AND c.environment_id = $2 AND c.key = $3
"#;

/// PostgreSQL-backed config store
#[derive(Clone, Debug)]
pub struct PgConfigStore {
    pool: DatabasePool,
}

impl PgConfigStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        self.pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to begin transaction", &e))
    }

    /// Next version for a locked record
    async fn next_version(tx: &mut Transaction<'_, Postgres>, config_id: i64) -> DatabaseResult<i32> {
        let head: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) FROM config_versions WHERE config_id = $1",
        )
        .bind(config_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to get max version", &e))?;

        next_version(head)
    }

    /// Insert the snapshot and advance the record's current-version pointer
    async fn append_version(
        tx: &mut Transaction<'_, Postgres>,
        config_id: i64,
        version: i32,
        data: &Value,
        schema: &Value,
        actor: &str,
    ) -> DatabaseResult<(DateTime<Utc>, DateTime<Utc>)> {
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO config_versions (config_id, version, data, schema, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at
            "#,
        )
        .bind(config_id)
        .bind(version)
        .bind(data)
        .bind(schema)
        .bind(actor)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to insert version", &e))?;

        let updated_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            UPDATE configs SET current_version = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(config_id)
        .bind(version)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to advance current version", &e))?;

        Ok((created_at, updated_at))
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn create_or_update(
        &self,
        key: &ConfigKey,
        data: Value,
        schema: Value,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion> {
        let mut tx = self.begin().await?;

        // The upsert takes the row lock on the logical record; it is held
        // until commit, which serialises writers to this key.
        let config_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO configs (project_id, environment_id, key)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, environment_id, key) DO UPDATE
                SET updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(key.project_id)
        .bind(key.env_id)
        .bind(&key.key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to upsert config parent", &e))?;

        let version = Self::next_version(&mut tx, config_id).await?;
        debug!(config = %key, config_id, version, "Appending config version");

        let (created_at, updated_at) =
            Self::append_version(&mut tx, config_id, version, &data, &schema, actor).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to commit transaction", &e))?;

        info!(config = %key, version, actor, "Config version recorded");

        Ok(ConfigVersion {
            id: config_id,
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
            version,
            data,
            schema,
            created_by: actor.to_string(),
            created_at,
            updated_at,
        })
    }

    async fn get_latest(&self, key: &ConfigKey) -> DatabaseResult<Option<ConfigVersion>> {
        let sql = format!("{SELECT_VERSIONS} ORDER BY v.version DESC LIMIT 1");

        let row = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(key.project_id)
            .bind(key.env_id)
            .bind(&key.key)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to fetch latest version", &e))?;

        Ok(row.map(|r| r.into_version(key)))
    }

    async fn rollback(
        &self,
        key: &ConfigKey,
        target_version: i32,
        actor: &str,
    ) -> DatabaseResult<ConfigVersion> {
        let mut tx = self.begin().await?;

        let config_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM configs
            WHERE project_id = $1 AND environment_id = $2 AND key = $3
            FOR UPDATE
            "#,
        )
        .bind(key.project_id)
        .bind(key.env_id)
        .bind(&key.key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to resolve config", &e))?;

        let config_id = config_id.ok_or_else(|| DatabaseError::ConfigNotFound {
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
        })?;

        let target: Option<(Value, Value)> = sqlx::query_as(
            "SELECT data, schema FROM config_versions WHERE config_id = $1 AND version = $2",
        )
        .bind(config_id)
        .bind(target_version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to fetch target version", &e))?;

        let (data, schema) = target.ok_or_else(|| DatabaseError::VersionNotFound {
            key: key.key.clone(),
            version: target_version,
        })?;

        let version = Self::next_version(&mut tx, config_id).await?;
        debug!(config = %key, target_version, version, "Replaying version content");

        let (created_at, updated_at) =
            Self::append_version(&mut tx, config_id, version, &data, &schema, actor).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to commit rollback", &e))?;

        info!(config = %key, target_version, version, actor, "Config rolled back");

        Ok(ConfigVersion {
            id: config_id,
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
            version,
            data,
            schema,
            created_by: actor.to_string(),
            created_at,
            updated_at,
        })
    }

    async fn get_version(
        &self,
        key: &ConfigKey,
        version: i32,
    ) -> DatabaseResult<Option<ConfigVersion>> {
        let sql = format!("{SELECT_VERSIONS} AND v.version = $4");

        let row = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(key.project_id)
            .bind(key.env_id)
            .bind(&key.key)
            .bind(version)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to fetch version", &e))?;

        Ok(row.map(|r| r.into_version(key)))
    }

    async fn list_versions(&self, key: &ConfigKey) -> DatabaseResult<Vec<ConfigVersion>> {
        let sql = format!("{SELECT_VERSIONS} ORDER BY v.version ASC");

        let rows = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(key.project_id)
            .bind(key.env_id)
            .bind(&key.key)
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| DatabaseError::from_sqlx("failed to list versions", &e))?;

        Ok(rows.into_iter().map(|r| r.into_version(key)).collect())
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }
}
