use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("config not found: project {project_id}, environment {env_id}, key '{key}'")]
    ConfigNotFound {
        project_id: i64,
        env_id: i64,
        key: String,
    },

    #[error("target version {version} not found for key '{key}'")]
    VersionNotFound { key: String, version: i32 },

    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl DatabaseError {
    /// Classify a driver error: transport and pool failures mean the store
    /// is unavailable, everything else is a failed statement.
    pub fn from_sqlx(context: &str, err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::ConnectionFailed(format!("{context}: {err}")),
            _ => Self::QueryFailed(format!("{context}: {err}")),
        }
    }

    /// Either the composite key or the requested version does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. } | Self::VersionNotFound { .. })
    }

    /// The backend could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
