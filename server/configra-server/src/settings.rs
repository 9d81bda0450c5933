//! Layered server settings
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `configra.toml` in the working directory, or the file given with `--config`
//! 3. `CONFIGRA__SECTION__KEY` environment variables
//! 4. `DATABASE_URL`

use config::{Config, ConfigError, Environment, File};
use config_engine::{LintPolicy, DEFAULT_LINT_TIMEOUT};
use database_layer::PoolSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub lint: LintSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub connect_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// API key of the project registered at startup by the memory backend;
    /// a random key is issued when unset
    #[serde(default)]
    pub bootstrap_api_key: Option<String>,
}

impl StorageSettings {
    pub fn bootstrap_key(&self) -> Option<&str> {
        self.bootstrap_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LintSettings {
    /// Deep-lint base URL; linting is skipped when unset or empty
    pub url: Option<String>,
    pub timeout_secs: u64,
    /// Fail writes when the linter is unreachable
    pub strict: bool,
}

impl LintSettings {
    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn policy(&self) -> LintPolicy {
        if self.strict {
            LintPolicy::Strict
        } else {
            LintPolicy::Lenient
        }
    }
}

impl DatabaseSettings {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            url: self.url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
            connect_attempts: self.connect_attempts,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

impl Settings {
    /// Load settings from every layer
    ///
    /// # Errors
    ///
    /// Fails when an explicitly named file is missing or any layer holds a
    /// value of the wrong type.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("configra").required(false),
        };

        let mut builder = Self::defaults()?.add_source(file).add_source(
            Environment::with_prefix("CONFIGRA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Defaults only, with an in-memory store
    ///
    /// # Errors
    ///
    /// Only fails if the built-in defaults are inconsistent.
    pub fn in_memory() -> Result<Self, ConfigError> {
        Self::defaults()?
            .set_override("storage.backend", "memory")?
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let timeout_secs = i64::try_from(DEFAULT_LINT_TIMEOUT.as_secs()).unwrap_or(5);

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", PoolSettings::default().url)?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.connect_attempts", 5)?
            .set_default("database.retry_delay_secs", 2)?
            .set_default("storage.backend", "postgres")?
            .set_default("lint.timeout_secs", timeout_secs)?
            .set_default("lint.strict", false)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let settings = Settings::in_memory().unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert_eq!(settings.database.connect_attempts, 5);
        assert_eq!(settings.database.retry_delay_secs, 2);
        assert_eq!(settings.lint.timeout(), Duration::from_secs(5));
        assert_eq!(settings.lint.policy(), LintPolicy::Lenient);
        assert!(settings.lint.endpoint().is_none());
        assert!(settings.storage.bootstrap_key().is_none());
    }

    #[test]
    fn blank_lint_url_disables_linting() {
        let lint = LintSettings {
            url: Some("  ".to_string()),
            timeout_secs: 5,
            strict: true,
        };
        assert!(lint.endpoint().is_none());
        assert_eq!(lint.policy(), LintPolicy::Strict);
    }

    #[test]
    fn pool_settings_carry_retry_policy() {
        let settings = Settings::in_memory().unwrap();
        let pool = settings.database.pool_settings();
        assert_eq!(pool.connect_attempts, 5);
        assert_eq!(pool.retry_delay, Duration::from_secs(2));
        assert_eq!(pool.max_connections, 10);
    }
}
