//! JSON-file implementation of the settings persistence port.
//!
//! The whole blob lives in a single pretty-printed document under a fixed
//! path (`~/.nova/settings.json` by default).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::storage::SettingsStorage;
use crate::types::Settings;

/// File name of the settings document
pub const SETTINGS_FILE: &str = "settings.json";

/// Settings persisted to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default location (`~/.nova/settings.json`)
    pub fn at_default_path() -> StoreResult<Self> {
        Ok(Self::new(default_settings_path()?))
    }

    /// Path of the settings document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStorage for JsonFileStorage {
    async fn load(&self) -> StoreResult<Option<Settings>> {
        if !self.path.exists() {
            debug!("no settings file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let settings = serde_json::from_str(&content)?;
        info!("loaded settings from {:?}", self.path);
        Ok(Some(settings))
    }

    async fn save(&self, settings: &Settings) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, content).await?;
        debug!("settings saved to {:?}", self.path);
        Ok(())
    }
}

/// Default settings path (`~/.nova/settings.json`)
pub fn default_settings_path() -> StoreResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StoreError::InvalidPath("could not find home directory".to_string()))?;
    Ok(home.join(".nova").join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join(SETTINGS_FILE));
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join(SETTINGS_FILE));

        let mut settings = Settings::default();
        settings.api_key = "sk-test".to_string();
        storage.save(&settings).await.unwrap();

        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.api_key, "sk-test");
        assert_eq!(loaded.chat_history.len(), 3);
    }
}
