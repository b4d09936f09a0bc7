//! Persistent settings storage
//!
//! Small key/value store used to remember the selected API identifier
//! between runs.

use crate::{MockApiError, Result};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Key the selected API identifier is stored under
pub const API_IDENTIFIER_KEY: &str = "boosttrade.api_identifier";

/// Identifiers accepted by `set_api_identifier`
pub const AVAILABLE_IDENTIFIERS: [&str; 4] = ["default", "staging", "development", "testing"];

pub const DEFAULT_IDENTIFIER: &str = "default";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>>;

    async fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings kept as a flat JSON object on disk
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(MockApiError::Storage(format!(
                "Settings file {} is not a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let settings = self.read_all().await?;
        Ok(settings.get(key).and_then(Value::as_str).map(str::to_string))
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = match self.read_all().await {
            Ok(settings) => settings,
            Err(e @ MockApiError::Io(_)) => return Err(e),
            Err(e) => {
                warn!(
                    "Discarding unreadable settings file {}: {}",
                    self.path.display(),
                    e
                );
                Map::new()
            }
        };
        settings.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_vec_pretty(&Value::Object(settings))?;

        // Readers only ever observe a complete file
        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!("Saved setting {} to {}", key, self.path.display());
        Ok(())
    }
}

pub fn is_known_identifier(identifier: &str) -> bool {
    AVAILABLE_IDENTIFIERS.contains(&identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load(API_IDENTIFIER_KEY).await.unwrap(), None);

        store.save(API_IDENTIFIER_KEY, "staging").await.unwrap();
        assert_eq!(
            store.load(API_IDENTIFIER_KEY).await.unwrap().as_deref(),
            Some("staging")
        );
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("settings.json");

        FileSettingsStore::new(&path)
            .save(API_IDENTIFIER_KEY, "testing")
            .await
            .unwrap();
        FileSettingsStore::new(&path)
            .save("other.key", "x")
            .await
            .unwrap();

        let reopened = FileSettingsStore::new(&path);
        assert_eq!(
            reopened.load(API_IDENTIFIER_KEY).await.unwrap().as_deref(),
            Some("testing")
        );
        assert_eq!(reopened.load("other.key").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_file_store_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let result = FileSettingsStore::new(&path).load(API_IDENTIFIER_KEY).await;
        assert!(matches!(result, Err(MockApiError::Storage(_))));
    }

    #[tokio::test]
    async fn test_file_store_recovers_from_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"boosttrade.api_identifier": "stag"#).unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(store.load(API_IDENTIFIER_KEY).await.is_err());

        store.save(API_IDENTIFIER_KEY, "staging").await.unwrap();
        assert_eq!(
            store.load(API_IDENTIFIER_KEY).await.unwrap().as_deref(),
            Some("staging")
        );
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_overwrites_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let store = FileSettingsStore::new(&path);
        store.save(API_IDENTIFIER_KEY, "testing").await.unwrap();
        assert_eq!(
            store.load(API_IDENTIFIER_KEY).await.unwrap().as_deref(),
            Some("testing")
        );
    }

    #[test]
    fn test_known_identifiers() {
        assert!(is_known_identifier("development"));
        assert!(!is_known_identifier("production"));
    }
}
