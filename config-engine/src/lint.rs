//! Deep-lint collaborator client
//!
//! An optional remote service re-checks a schema and an already accepted
//! payload with richer domain rules. It is consulted only by
//! [`ConfigService`](crate::ConfigService).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default round-trip budget for one lint call
pub const DEFAULT_LINT_TIMEOUT: Duration = Duration::from_secs(5);

/// What to do when the linter cannot be reached or answers badly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintPolicy {
    /// Log a warning and persist anyway
    #[default]
    Lenient,
    /// Fail the write with `CollaboratorUnavailable`
    Strict,
}

/// Linter's answer to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintVerdict {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Informational health score, not used for the decision
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Error, Debug)]
pub enum LintError {
    #[error("failed to build lint client: {0}")]
    Client(String),

    #[error("linter unreachable: {0}")]
    Unreachable(String),

    #[error("linter returned status {0}")]
    Status(u16),

    #[error("failed to decode linter response: {0}")]
    Malformed(String),
}

#[derive(Serialize)]
struct LintRequest<'a> {
    schema: &'a Value,
    config: &'a Value,
}

#[async_trait]
pub trait DeepLinter: Send + Sync {
    /// Ask for a verdict on `config` under `schema`
    async fn lint(&self, schema: &Value, config: &Value) -> Result<LintVerdict, LintError>;
}

/// HTTP linter speaking `POST {base}/v1/lint`
#[derive(Debug, Clone)]
pub struct HttpDeepLinter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeepLinter {
    /// # Errors
    ///
    /// Returns [`LintError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LintError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LintError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/lint", self.base_url)
    }
}

#[async_trait]
impl DeepLinter for HttpDeepLinter {
    async fn lint(&self, schema: &Value, config: &Value) -> Result<LintVerdict, LintError> {
        let response = self
            .client
            .post(self.url())
            .json(&LintRequest { schema, config })
            .send()
            .await
            .map_err(|e| LintError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LintError::Status(status.as_u16()));
        }

        let verdict: LintVerdict = response
            .json()
            .await
            .map_err(|e| LintError::Malformed(e.to_string()))?;

        debug!(valid = verdict.valid, issues = verdict.errors.len(), "Deep-lint verdict");
        Ok(verdict)
    }
}
