//! Thin HTTP client for the Configra API

use anyhow::{bail, Context, Result};
use database_layer::ConfigVersion;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

/// Error body shape shared by every endpoint
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    violations: Vec<String>,
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let api_key = self
            .api_key
            .as_deref()
            .context("an API key is required (--api-key or CONFIGRA_API_KEY)")?;

        tracing::debug!(%method, path, "calling Configra API");
        Ok(self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, api_key))
    }

    /// Store a new version
    ///
    /// # Errors
    ///
    /// Fails on transport errors or any non-success response.
    pub async fn push(&self, env_id: i64, key: &str, data: &Value, schema: &Value) -> Result<ConfigVersion> {
        let request = self
            .request(Method::POST, "/v1/configs")?
            .json(&json!({ "env_id": env_id, "key": key, "data": data, "schema": schema }));
        decode(send(request).await?).await
    }

    /// Latest version of a key
    ///
    /// # Errors
    ///
    /// Fails on transport errors or any non-success response.
    pub async fn fetch(&self, env_id: i64, key: &str) -> Result<ConfigVersion> {
        let request = self
            .request(Method::GET, "/v1/configs")?
            .query(&[("env_id", env_id.to_string()), ("key", key.to_string())]);
        decode(send(request).await?).await
    }

    /// Full history of a key, oldest first
    ///
    /// # Errors
    ///
    /// Fails on transport errors or any non-success response.
    pub async fn history(&self, env_id: i64, key: &str) -> Result<Vec<ConfigVersion>> {
        let request = self
            .request(Method::GET, "/v1/configs/versions")?
            .query(&[("env_id", env_id.to_string()), ("key", key.to_string())]);
        decode(send(request).await?).await
    }

    /// Replay `target_version` as the new head
    ///
    /// # Errors
    ///
    /// Fails on transport errors or any non-success response.
    pub async fn rollback(&self, env_id: i64, key: &str, target_version: i32) -> Result<ConfigVersion> {
        let request = self.request(Method::POST, "/v1/rollback")?.json(&json!({
            "env_id": env_id,
            "key": key,
            "target_version": target_version,
        }));
        decode(send(request).await?).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.context("failed to reach the Configra API")
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.context("unexpected response from the Configra API");
    }

    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.violations.is_empty() => {
            bail!("{} ({status})\n  - {}", body.error, body.violations.join("\n  - "))
        }
        Ok(body) => bail!("{} ({status})", body.error),
        Err(_) => bail!("API returned {status}: {text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version_body(version: i32) -> String {
        json!({
            "id": 1, "project_id": 1, "env_id": 1, "key": "feature_flags",
            "version": version, "data": {"a": 1}, "schema": {},
            "created_by": "project:1",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        })
        .to_string()
    }

    #[tokio::test]
    async fn push_sends_api_key_and_decodes_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/configs")
            .match_header("x-api-key", "secret")
            .with_status(201)
            .with_body(version_body(4))
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), Some("secret".into())).unwrap();
        let created = client
            .push(1, "feature_flags", &json!({"a": 1}), &json!({}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.version, 4);
    }

    #[tokio::test]
    async fn error_bodies_surface_every_violation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/configs")
            .with_status(400)
            .with_body(
                json!({
                    "error": "validation failed: x; y",
                    "error_id": "1", "error_type": "validation_error", "code": "VALIDATION_1001",
                    "violations": ["x", "y"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), Some("k".into())).unwrap();
        let err = client.push(1, "k", &json!({}), &json!({})).await.unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("validation failed: x; y"));
        assert!(message.contains("  - y"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_sending() {
        let client = ApiClient::new("http://127.0.0.1:1", None).unwrap();
        let err = client.fetch(1, "k").await.unwrap_err();
        assert!(err.to_string().contains("API key is required"));
    }
}
