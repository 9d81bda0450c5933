use crate::settings::{Settings, StorageBackend};
use anyhow::{Context, Result};
use config_engine::{ConfigService, HttpDeepLinter};
use database_layer::{
    generate_api_key, migration::run_migrations, ConfigStore, DatabasePool, InMemoryConfigStore,
    InMemoryProjectDirectory, PgConfigStore, PgProjectDirectory, Project, ProjectDirectory,
};
use std::sync::Arc;
use tracing::{info, warn};

const BOOTSTRAP_PROJECT: &str = "default";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ConfigraServer {
    /// Validation, deep-lint and persistence
    pub service: ConfigService,
    /// API key resolution
    pub projects: Arc<dyn ProjectDirectory>,
    pub backend: StorageBackend,
    /// Present for the PostgreSQL backend, closed on shutdown
    pool: Option<DatabasePool>,
    /// Project registered at startup by the memory backend
    bootstrap: Option<Project>,
}

impl ConfigraServer {
    pub fn new(
        service: ConfigService,
        projects: Arc<dyn ProjectDirectory>,
        backend: StorageBackend,
    ) -> Self {
        Self {
            service,
            projects,
            backend,
            pool: None,
            bootstrap: None,
        }
    }

    /// Build the backend named in `settings`; for PostgreSQL this connects
    /// with retry and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Fails when the database stays unreachable, a migration fails, or the
    /// deep-lint client cannot be built.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let mut bootstrap = None;
        let (store, projects, pool): (Arc<dyn ConfigStore>, Arc<dyn ProjectDirectory>, _) =
            match settings.storage.backend {
                StorageBackend::Postgres => {
                    let pool = DatabasePool::connect(&settings.database.pool_settings())
                        .await
                        .context("database bootstrap failed")?;
                    run_migrations(&pool)
                        .await
                        .context("database migration failed")?;
                    (
                        Arc::new(PgConfigStore::new(pool.clone())),
                        Arc::new(PgProjectDirectory::new(pool.clone())),
                        Some(pool),
                    )
                }
                StorageBackend::Memory => {
                    info!("Using in-memory storage; data is lost on restart");
                    let directory = Arc::new(InMemoryProjectDirectory::new());
                    bootstrap = Some(register_bootstrap_project(&directory, settings));
                    (Arc::new(InMemoryConfigStore::new()), directory, None)
                }
            };

        let mut service = ConfigService::new(store);
        if let Some(url) = settings.lint.endpoint() {
            let linter = HttpDeepLinter::new(url, settings.lint.timeout())
                .context("failed to build deep-lint client")?;
            service = service.with_linter(Arc::new(linter), settings.lint.policy());
            info!(url, policy = ?settings.lint.policy(), "Deep-lint enabled");
        }

        Ok(Self {
            service,
            projects,
            backend: settings.storage.backend,
            pool,
            bootstrap,
        })
    }

    /// In-memory server around an existing project directory
    pub fn in_memory(projects: Arc<InMemoryProjectDirectory>) -> Self {
        Self::new(
            ConfigService::new(Arc::new(InMemoryConfigStore::new())),
            projects,
            StorageBackend::Memory,
        )
    }

    /// Project the memory backend registered at startup
    pub fn bootstrap_project(&self) -> Option<&Project> {
        self.bootstrap.as_ref()
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// The memory backend has no persistent project table; register one
/// project so authenticated endpoints are usable.
fn register_bootstrap_project(directory: &InMemoryProjectDirectory, settings: &Settings) -> Project {
    match settings.storage.bootstrap_key() {
        Some(api_key) => {
            let project = directory.insert_with_key(BOOTSTRAP_PROJECT, 0, api_key);
            info!(project_id = project.id, "Registered bootstrap project with configured API key");
            project
        }
        None => {
            let project = directory.insert_with_key(BOOTSTRAP_PROJECT, 0, &generate_api_key());
            warn!(
                project_id = project.id,
                api_key = %project.api_key,
                "Registered bootstrap project with a generated API key; set CONFIGRA__STORAGE__BOOTSTRAP_API_KEY to pin it"
            );
            project
        }
    }
}
