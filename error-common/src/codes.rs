// Standardized error codes for Configra API responses

use serde::Serialize;
use std::fmt;

pub mod validation {
    use super::ErrorCode;

    pub const INVALID_CONFIG: ErrorCode = ErrorCode("VALIDATION_1001");
    pub const INVALID_REQUEST: ErrorCode = ErrorCode("VALIDATION_1002");
}

pub mod authentication {
    use super::ErrorCode;

    pub const MISSING_API_KEY: ErrorCode = ErrorCode("AUTH_2001");
    pub const INVALID_API_KEY: ErrorCode = ErrorCode("AUTH_2002");
}

pub mod lookup {
    use super::ErrorCode;

    pub const CONFIG_NOT_FOUND: ErrorCode = ErrorCode("NOT_FOUND_3001");
    pub const VERSION_NOT_FOUND: ErrorCode = ErrorCode("NOT_FOUND_3002");
}

pub mod storage {
    use super::ErrorCode;

    pub const UNAVAILABLE: ErrorCode = ErrorCode("DB_4001");
    pub const QUERY_FAILED: ErrorCode = ErrorCode("DB_4002");
}

pub mod collaborator {
    use super::ErrorCode;

    pub const UNAVAILABLE: ErrorCode = ErrorCode("LINT_5001");
}

pub mod internal {
    use super::ErrorCode;

    pub const UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_9001");
}

/// Machine-readable error code attached to API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
