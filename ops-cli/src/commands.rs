//! Subcommand implementations

use crate::client::ApiClient;
use anyhow::{Context, Result};
use colored::Colorize;
use config_engine::validate_document;
use database_layer::{
    migration::run_migrations, ConfigVersion, DatabasePool, PgProjectDirectory, PoolSettings,
    ProjectDirectory,
};
use serde_json::Value;
use std::path::Path;
use std::process::ExitCode;

/// Read and parse a JSON document
///
/// # Errors
///
/// Fails if the file cannot be read or is not valid JSON.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {} as JSON", path.display()))
}

/// Local validation; returns a failing exit code when violations exist
///
/// # Errors
///
/// Fails only when an input file cannot be loaded.
pub fn validate(schema_path: &Path, config_path: &Path) -> Result<ExitCode> {
    println!(
        "Validating {} against {}...",
        config_path.display(),
        schema_path.display()
    );

    let schema = read_json(schema_path)?;
    let config = read_json(config_path)?;

    match validate_document(&schema, &config) {
        Ok(_) => {
            println!("{}", "✅ Configuration is VALID.".green());
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => {
            println!("{} ({} violation(s))", "❌ Validation FAILED".red(), errors.len());
            for message in errors.iter() {
                println!("  - {message}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Validate locally, then store a new version through the API
///
/// # Errors
///
/// Fails on unreadable input or when the API rejects the push.
pub async fn push(
    client: &ApiClient,
    config_path: &Path,
    schema_path: &Path,
    env_id: i64,
    key: &str,
) -> Result<ExitCode> {
    let schema = read_json(schema_path)?;
    let data = read_json(config_path)?;

    if let Err(errors) = validate_document(&schema, &data) {
        println!("{}", "Validation failed locally:".red());
        for message in errors.iter() {
            println!("  - {message}");
        }
        return Ok(ExitCode::FAILURE);
    }

    let created = client.push(env_id, key, &data, &schema).await?;
    println!(
        "{} '{}' is now at version {}",
        "✅ Pushed".green(),
        created.key,
        created.version
    );
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Fails when the API cannot be reached or the key does not exist.
pub async fn fetch(client: &ApiClient, env_id: i64, key: &str) -> Result<ExitCode> {
    let latest = client.fetch(env_id, key).await?;
    println!("{}", serde_json::to_string_pretty(&latest)?);
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Fails when the API cannot be reached or the key does not exist.
pub async fn history(client: &ApiClient, env_id: i64, key: &str) -> Result<ExitCode> {
    let versions = client.history(env_id, key).await?;
    for line in history_lines(&versions) {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}

/// One line per version, newest marked as current
pub fn history_lines(versions: &[ConfigVersion]) -> Vec<String> {
    let head = versions.iter().map(|v| v.version).max();
    versions
        .iter()
        .map(|v| {
            let marker = if Some(v.version) == head { " (current)" } else { "" };
            format!(
                "v{:<4} {}  by {}{marker}",
                v.version,
                v.created_at.format("%Y-%m-%d %H:%M:%S"),
                v.created_by
            )
        })
        .collect()
}

/// # Errors
///
/// Fails when the key or target version does not exist.
pub async fn rollback(client: &ApiClient, env_id: i64, key: &str, target_version: i32) -> Result<ExitCode> {
    let restored = client.rollback(env_id, key, target_version).await?;
    println!(
        "{} '{}' to version {} (new version {})",
        "✅ Rolled back".green(),
        key,
        target_version,
        restored.version
    );
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Fails when the database stays unreachable or a migration fails.
pub async fn migrate(database_url: &str) -> Result<ExitCode> {
    println!("Running migrations against {}...", mask_url(database_url));
    let pool = DatabasePool::connect(&PoolSettings::new(database_url)).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    println!("{}", "✅ Migrations completed successfully.".green());
    Ok(ExitCode::SUCCESS)
}

/// Register a project and print its API key once
///
/// # Errors
///
/// Fails when the database is unreachable or the insert fails.
pub async fn create_project(database_url: &str, name: &str, owner_id: i64) -> Result<ExitCode> {
    let pool = DatabasePool::connect(&PoolSettings::new(database_url)).await?;
    let project = PgProjectDirectory::new(pool.clone()).create(name, owner_id).await?;
    pool.close().await;

    println!("{} '{}' (id {})", "✅ Created project".green(), project.name, project.id);
    println!("API key: {}", project.api_key.bold());
    println!("{}", "Store this key now; it is not shown again.".yellow());
    Ok(ExitCode::SUCCESS)
}

/// Hide the password part of a connection URL
pub fn mask_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or(credentials);
            format!("{scheme}://{user}:****@{host}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn version(n: i32, by: &str) -> ConfigVersion {
        serde_json::from_value(json!({
            "id": 1, "project_id": 1, "env_id": 1, "key": "flags",
            "version": n, "data": {}, "schema": {}, "created_by": by,
            "created_at": "2024-03-01T12:00:00Z", "updated_at": "2024-03-01T12:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn masks_passwords() {
        assert_eq!(
            mask_url("postgresql://configra:s3cret@db:5432/configra"),
            "postgresql://configra:****@db:5432/configra"
        );
        assert_eq!(mask_url("postgresql://db/configra"), "postgresql://db/configra");
    }

    #[test]
    fn history_marks_current_version() {
        let lines = history_lines(&[version(1, "project:1"), version(2, "project:1")]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("v1 "));
        assert!(!lines[0].ends_with("(current)"));
        assert!(lines[1].ends_with("(current)"));
        assert!(lines[1].contains("2024-03-01 12:00:00"));
    }

    #[test]
    fn validate_reports_failure_exit_code() {
        let dir = std::env::temp_dir().join(format!("configra-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let schema = dir.join("schema.json");
        let config = dir.join("config.json");
        std::fs::write(&schema, r#"{"rules": {"enabled": {"type": "bool", "required": true}}}"#).unwrap();

        std::fs::write(&config, r#"{"enabled": true}"#).unwrap();
        assert_eq!(validate(&schema, &config).unwrap(), ExitCode::SUCCESS);

        std::fs::write(&config, r#"{"enabled": "yes"}"#).unwrap();
        assert_eq!(validate(&schema, &config).unwrap(), ExitCode::FAILURE);

        assert!(validate(&dir.join("missing.json"), &config).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
