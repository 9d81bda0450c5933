use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use config_engine::ConfigError;
use error_common::{codes, ErrorCode, ValidationErrors};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Correlation id, also written to the server log
    pub error_id: String,
    pub error_type: String,
    /// Stable machine-readable code
    pub code: String,
    /// Individual violations, present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<String>>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(ValidationErrors),

    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    Authentication {
        message: String,
        code: ErrorCode,
    },

    #[error("{message}")]
    NotFound { message: String, code: ErrorCode },

    #[error("{message}")]
    CollaboratorUnavailable { message: String },

    #[error("{message}")]
    StorageUnavailable { message: String },

    #[error("{message}")]
    Storage { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn missing_api_key() -> Self {
        Self::Authentication {
            message: "missing api key".to_string(),
            code: codes::authentication::MISSING_API_KEY,
        }
    }

    pub fn invalid_api_key() -> Self {
        Self::Authentication {
            message: "invalid api key".to_string(),
            code: codes::authentication::INVALID_API_KEY,
        }
    }

    pub fn config_not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: codes::lookup::CONFIG_NOT_FOUND,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::CollaboratorUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ApiError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::CollaboratorUnavailable { .. } => "collaborator_unavailable",
            ApiError::StorageUnavailable { .. } => "storage_unavailable",
            ApiError::Storage { .. } => "storage_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => codes::validation::INVALID_CONFIG,
            ApiError::BadRequest { .. } => codes::validation::INVALID_REQUEST,
            ApiError::Authentication { code, .. } | ApiError::NotFound { code, .. } => *code,
            ApiError::CollaboratorUnavailable { .. } => codes::collaborator::UNAVAILABLE,
            ApiError::StorageUnavailable { .. } => codes::storage::UNAVAILABLE,
            ApiError::Storage { .. } => codes::storage::QUERY_FAILED,
            ApiError::Internal { .. } => codes::internal::UNEXPECTED,
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation(errors) => Self::Validation(errors),
            ConfigError::NotFound(message) => {
                let code = if message.starts_with("target version") {
                    codes::lookup::VERSION_NOT_FOUND
                } else {
                    codes::lookup::CONFIG_NOT_FOUND
                };
                Self::NotFound { message, code }
            }
            ConfigError::CollaboratorUnavailable(_) => Self::CollaboratorUnavailable {
                message: err.to_string(),
            },
            ConfigError::StorageUnavailable(_) => Self::StorageUnavailable {
                message: err.to_string(),
            },
            ConfigError::Storage(_) => Self::Storage {
                message: err.to_string(),
            },
        }
    }
}

impl From<database_layer::DatabaseError> for ApiError {
    fn from(err: database_layer::DatabaseError) -> Self {
        ConfigError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        Self::bad_request("invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected query string");
        Self::bad_request("invalid query parameters")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API request rejected"
            );
        }

        let violations = match &self {
            ApiError::Validation(errors) => Some(errors.messages().to_vec()),
            _ => None,
        };

        let body = ApiErrorResponse {
            error: self.to_string(),
            error_id,
            error_type: self.error_type().to_string(),
            code: self.code().to_string(),
            violations,
        };

        (status_code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use database_layer::DatabaseError;

    #[test]
    fn validation_keeps_aggregate_message() {
        let err = ApiError::from(ConfigError::Validation(ValidationErrors::from_messages([
            "field 'a' is required",
            "unknown field 'b' is not allowed by schema",
        ])));

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "validation failed: field 'a' is required; unknown field 'b' is not allowed by schema"
        );
    }

    #[test]
    fn storage_errors_map_to_5xx() {
        let down = ApiError::from(DatabaseError::ConnectionFailed("refused".into()));
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let failed = ApiError::from(DatabaseError::QueryFailed("deadlock".into()));
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let lint = ApiError::from(ConfigError::CollaboratorUnavailable("timeout".into()));
        assert_eq!(lint.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_is_404() {
        let err = ApiError::from(DatabaseError::VersionNotFound {
            key: "flags".into(),
            version: 3,
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("target version 3 not found"));
    }
}
