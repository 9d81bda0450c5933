//! API-key authentication
//!
//! The `X-API-Key` header is resolved to a project once per request and
//! handed to the handler as an explicit [`ProjectScope`].

use crate::error::ApiError;
use crate::server::ConfigraServer;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use database_layer::Project;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The authenticated project a request acts on
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub project_id: i64,
    pub project_name: String,
}

impl ProjectScope {
    /// Identifier recorded as `created_by` on writes
    pub fn actor(&self) -> String {
        format!("project:{}", self.project_id)
    }
}

impl From<Project> for ProjectScope {
    fn from(project: Project) -> Self {
        Self {
            project_id: project.id,
            project_name: project.name,
        }
    }
}

#[async_trait]
impl FromRequestParts<ConfigraServer> for ProjectScope {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        server: &ConfigraServer,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(ApiError::missing_api_key)?;

        let project = server
            .projects
            .find_by_api_key(api_key)
            .await?
            .ok_or_else(ApiError::invalid_api_key)?;

        debug!(project_id = project.id, "Request authenticated");
        Ok(project.into())
    }
}
