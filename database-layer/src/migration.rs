// Embedded schema migrations
use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::migrate::Migrator;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every pending migration; already-applied ones are skipped.
///
/// # Errors
///
/// Returns [`DatabaseError::MigrationError`] if a migration fails to apply
/// or an applied migration no longer matches its checksum.
pub async fn run_migrations(pool: &DatabasePool) -> DatabaseResult<()> {
    info!(
        migrations = MIGRATOR.iter().count(),
        "Applying database migrations"
    );

    MIGRATOR
        .run(pool.pool())
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    info!("Database migrations applied");
    Ok(())
}
