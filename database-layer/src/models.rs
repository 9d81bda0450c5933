// Database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Composite identity of a logical configuration record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    pub project_id: i64,
    pub env_id: i64,
    pub key: String,
}

impl ConfigKey {
    pub fn new(project_id: i64, env_id: i64, key: impl Into<String>) -> Self {
        Self {
            project_id,
            env_id,
            key: key.into(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project_id, self.env_id, self.key)
    }
}

/// One immutable snapshot of a configuration, joined with its logical record.
///
/// `id` is the logical record's identifier; `created_at` belongs to the
/// snapshot, `updated_at` to the logical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub id: i64,
    pub project_id: i64,
    pub env_id: i64,
    pub key: String,
    pub version: i32,
    pub data: Value,
    pub schema: Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigVersion {
    pub fn config_key(&self) -> ConfigKey {
        ConfigKey::new(self.project_id, self.env_id, self.key.clone())
    }

    /// Same `data` and `schema`, ignoring bookkeeping fields
    pub fn same_content(&self, other: &ConfigVersion) -> bool {
        self.data == other.data && self.schema == other.schema
    }
}

/// A tenant owning configurations, authenticated by its API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}
