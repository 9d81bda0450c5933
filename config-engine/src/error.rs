use database_layer::DatabaseError;
use error_common::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Payload or schema rejected, locally or by the deep linter
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Composite key or target version does not exist
    #[error("{0}")]
    NotFound(String),

    /// Deep-lint endpoint unreachable or answered with garbage
    #[error("deep-lint collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DatabaseError> for ConfigError {
    fn from(err: DatabaseError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_unavailable() {
            Self::StorageUnavailable(err.to_string())
        } else {
            Self::Storage(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
