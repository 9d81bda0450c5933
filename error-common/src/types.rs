use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Aggregated list of validation violations.
///
/// Validation never stops at the first problem; every failed rule adds one
/// human-readable message here, in the order it was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing list of messages
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            errors: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Append every message of `other`, keeping order
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    pub fn into_messages(self) -> Vec<String> {
        self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {}", self.errors.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Top-level error for Configra binaries
#[derive(Error, Debug)]
pub enum ConfigraError {
    /// Payload rejected by schema or deep-lint checks
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Settings could not be loaded or are inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Persistence layer failures
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Listener or HTTP serving failures
    #[error("Server error: {0}")]
    ServerError(String),

    /// Outbound HTTP failures
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Configra operations
pub type Result<T> = std::result::Result<T, ConfigraError>;

/// Log an error with the operation it came from
pub fn log_error(context: &str, error: &ConfigraError) {
    tracing::error!(context = context, error = %error, "Configra error occurred");
}
