// Project directory: API-key based project resolution
use crate::{
    connection::DatabasePool,
    error::{DatabaseError, DatabaseResult},
    models::Project,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::RngCore;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

/// Generate a fresh 64-hex-character API key
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lookup and registration of projects
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Register a project and issue its API key
    async fn create(&self, name: &str, owner_id: i64) -> DatabaseResult<Project>;

    /// Resolve an API key to its project, `None` when the key is unknown
    async fn find_by_api_key(&self, api_key: &str) -> DatabaseResult<Option<Project>>;
}

/// In-memory project directory for testing and development
pub struct InMemoryProjectDirectory {
    by_key: DashMap<String, Project>,
    next_id: AtomicI64,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self {
            by_key: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register a project under a caller-chosen key
    pub fn insert_with_key(&self, name: &str, owner_id: i64, api_key: &str) -> Project {
        let project = Project {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            owner_id,
            api_key: api_key.to_string(),
            created_at: Utc::now(),
        };
        self.by_key.insert(api_key.to_string(), project.clone());
        project
    }
}

impl Default for InMemoryProjectDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn create(&self, name: &str, owner_id: i64) -> DatabaseResult<Project> {
        Ok(self.insert_with_key(name, owner_id, &generate_api_key()))
    }

    async fn find_by_api_key(&self, api_key: &str) -> DatabaseResult<Option<Project>> {
        Ok(self.by_key.get(api_key).map(|p| p.value().clone()))
    }
}

/// PostgreSQL-backed project directory
#[derive(Clone, Debug)]
pub struct PgProjectDirectory {
    pool: DatabasePool,
}

impl PgProjectDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectDirectory for PgProjectDirectory {
    async fn create(&self, name: &str, owner_id: i64) -> DatabaseResult<Project> {
        let api_key = generate_api_key();

        let (id, created_at): (i64, chrono::DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO projects (name, owner_id, api_key)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .bind(&api_key)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to create project", &e))?;

        info!(project_id = id, name, "Project created");

        Ok(Project {
            id,
            name: name.to_string(),
            owner_id,
            api_key,
            created_at,
        })
    }

    async fn find_by_api_key(&self, api_key: &str) -> DatabaseResult<Option<Project>> {
        let row: Option<(i64, String, i64, chrono::DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, name, owner_id, created_at FROM projects WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| DatabaseError::from_sqlx("failed to resolve api key", &e))?;

        Ok(row.map(|(id, name, owner_id, created_at)| Project {
            id,
            name,
            owner_id,
            api_key: api_key.to_string(),
            created_at,
        }))
    }
}
