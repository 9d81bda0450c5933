//! Orchestration Service
//!
//! Composes the validator, the optional deep linter and the versioned
//! store. Every entry point takes the caller's project id explicitly.

use crate::error::{ConfigError, Result};
use crate::lint::{DeepLinter, LintPolicy};
use crate::validation::{validate_document, Payload};
use database_layer::{ConfigKey, ConfigStore, ConfigVersion};
use error_common::ValidationErrors;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Write and read path for versioned configurations
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    linter: Option<Arc<dyn DeepLinter>>,
    policy: LintPolicy,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            linter: None,
            policy: LintPolicy::default(),
        }
    }

    /// Consult `linter` after local validation, applying `policy` on failure
    pub fn with_linter(mut self, linter: Arc<dyn DeepLinter>, policy: LintPolicy) -> Self {
        self.linter = Some(linter);
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LintPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    /// Local validation only, no collaborator and no storage
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] with every violation.
    pub fn validate(&self, schema: &Value, config: &Value) -> Result<Payload> {
        Ok(validate_document(schema, config)?)
    }

    /// Validate, optionally deep-lint, then append a new version.
    ///
    /// What gets persisted is the accepted payload, defaults included.
    ///
    /// # Errors
    ///
    /// Validation failures (local or from the linter) are returned before
    /// the store is touched. Storage failures are surfaced as-is.
    #[instrument(skip(self, data, schema), fields(config = %key))]
    pub async fn create_config(
        &self,
        key: &ConfigKey,
        data: &Value,
        schema: &Value,
        actor: &str,
    ) -> Result<ConfigVersion> {
        let accepted = Value::Object(validate_document(schema, data)?);

        self.deep_lint(schema, &accepted).await?;

        let created = self
            .store
            .create_or_update(key, accepted, schema.clone(), actor)
            .await?;

        info!(version = created.version, actor, "Configuration accepted");
        Ok(created)
    }

    /// Latest version, `None` when the key was never written
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub async fn get_config(&self, key: &ConfigKey) -> Result<Option<ConfigVersion>> {
        Ok(self.store.get_latest(key).await?)
    }

    /// Append a copy of `target_version` as the new head.
    ///
    /// The restored content is not re-validated against any newer schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the key or the target version
    /// does not exist.
    #[instrument(skip(self), fields(config = %key))]
    pub async fn rollback_config(
        &self,
        key: &ConfigKey,
        target_version: i32,
        actor: &str,
    ) -> Result<ConfigVersion> {
        Ok(self.store.rollback(key, target_version, actor).await?)
    }

    /// Full history, oldest first
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub async fn list_versions(&self, key: &ConfigKey) -> Result<Vec<ConfigVersion>> {
        Ok(self.store.list_versions(key).await?)
    }

    /// One historical version, `None` when it never existed
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub async fn get_version(&self, key: &ConfigKey, version: i32) -> Result<Option<ConfigVersion>> {
        Ok(self.store.get_version(key, version).await?)
    }

    pub async fn is_healthy(&self) -> bool {
        self.store.is_healthy().await
    }

    async fn deep_lint(&self, schema: &Value, accepted: &Value) -> Result<()> {
        let Some(linter) = &self.linter else {
            return Ok(());
        };

        match linter.lint(schema, accepted).await {
            Ok(verdict) if verdict.valid => Ok(()),
            Ok(verdict) => {
                let mut errors = ValidationErrors::new();
                if verdict.errors.is_empty() {
                    errors.push("deep-lint rejected configuration");
                }
                for issue in verdict.errors {
                    errors.push(format!("deep-lint: {issue}"));
                }
                Err(errors.into())
            }
            Err(e) => match self.policy {
                LintPolicy::Lenient => {
                    warn!(error = %e, "Deep-lint unavailable, proceeding without it");
                    Ok(())
                }
                LintPolicy::Strict => Err(ConfigError::CollaboratorUnavailable(e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::{LintError, LintVerdict};
    use async_trait::async_trait;
    use database_layer::InMemoryConfigStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Accept,
        Reject(Vec<String>),
        Down,
    }

    struct StubLinter {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl StubLinter {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DeepLinter for StubLinter {
        async fn lint(&self, _schema: &Value, _config: &Value) -> std::result::Result<LintVerdict, LintError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Accept => Ok(LintVerdict {
                    valid: true,
                    errors: vec![],
                    score: None,
                }),
                Behaviour::Reject(errors) => Ok(LintVerdict {
                    valid: false,
                    errors: errors.clone(),
                    score: None,
                }),
                Behaviour::Down => Err(LintError::Unreachable("connection refused".to_string())),
            }
        }
    }

    fn key() -> ConfigKey {
        ConfigKey::new(7, 1, "checkout")
    }

    fn schema() -> Value {
        json!({
            "version": 1,
            "rules": {
                "enabled": {"type": "bool", "required": true},
                "retries": {"type": "int", "min": 0, "max": 5, "default": 2}
            }
        })
    }

    fn service() -> (ConfigService, Arc<InMemoryConfigStore>) {
        let store = Arc::new(InMemoryConfigStore::new());
        (ConfigService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn persists_accepted_payload_with_defaults() {
        let (service, _) = service();
        let created = service
            .create_config(&key(), &json!({"enabled": true}), &schema(), "project:7")
            .await
            .unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.data, json!({"enabled": true, "retries": 2}));
        assert_eq!(created.schema, schema());
        assert_eq!(created.project_id, 7);
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_store_or_linter() {
        let store = Arc::new(InMemoryConfigStore::new());
        let linter = StubLinter::new(Behaviour::Accept);
        let service = ConfigService::new(store.clone()).with_linter(linter.clone(), LintPolicy::Strict);

        let err = service
            .create_config(&key(), &json!({"retries": 9}), &schema(), "a")
            .await
            .unwrap_err();

        let ConfigError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(linter.calls.load(Ordering::SeqCst), 0);
        assert!(store.get_latest(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn linter_rejection_merges_issues() {
        let (service, store) = service();
        let service = service.with_linter(
            StubLinter::new(Behaviour::Reject(vec!["retries too low".into(), "prod needs review".into()])),
            LintPolicy::Lenient,
        );

        let err = service
            .create_config(&key(), &json!({"enabled": true}), &schema(), "a")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "validation failed: deep-lint: retries too low; deep-lint: prod needs review"
        );
        assert!(store.get_latest(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn linter_rejection_without_issues_still_fails() {
        let (service, _) = service();
        let service = service.with_linter(StubLinter::new(Behaviour::Reject(vec![])), LintPolicy::Lenient);

        let err = service
            .create_config(&key(), &json!({"enabled": false}), &schema(), "a")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: deep-lint rejected configuration");
    }

    #[tokio::test]
    async fn unreachable_linter_follows_policy() {
        let (lenient, _) = service();
        let lenient = lenient.with_linter(StubLinter::new(Behaviour::Down), LintPolicy::Lenient);
        let created = lenient
            .create_config(&key(), &json!({"enabled": true}), &schema(), "a")
            .await
            .unwrap();
        assert_eq!(created.version, 1);

        let (strict, store) = service();
        let strict = strict.with_linter(StubLinter::new(Behaviour::Down), LintPolicy::Strict);
        let err = strict
            .create_config(&key(), &json!({"enabled": true}), &schema(), "a")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::CollaboratorUnavailable(_)));
        assert!(store.get_latest(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rollback_restores_without_revalidation() {
        let (service, _) = service();
        service
            .create_config(&key(), &json!({"enabled": true}), &schema(), "a")
            .await
            .unwrap();
        service
            .create_config(&key(), &json!({"enabled": false, "retries": 5}), &schema(), "a")
            .await
            .unwrap();

        let restored = service.rollback_config(&key(), 1, "b").await.unwrap();
        assert_eq!(restored.version, 3);
        assert_eq!(restored.data, json!({"enabled": true, "retries": 2}));

        let history = service.list_versions(&key()).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(
            service.get_version(&key(), 2).await.unwrap().unwrap().data,
            json!({"enabled": false, "retries": 5})
        );
    }

    #[tokio::test]
    async fn rollback_not_found_cases() {
        let (service, _) = service();

        let err = service.rollback_config(&key(), 1, "b").await.unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));

        service
            .create_config(&key(), &json!({"enabled": true}), &schema(), "a")
            .await
            .unwrap();
        let err = service.rollback_config(&key(), 5, "b").await.unwrap_err();
        assert!(matches!(&err, ConfigError::NotFound(m) if m.contains("target version 5 not found")));
    }

    #[tokio::test]
    async fn get_config_distinguishes_absence() {
        let (service, _) = service();
        assert!(service.get_config(&key()).await.unwrap().is_none());
    }
}
