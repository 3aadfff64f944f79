// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Small persisted key-value settings.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

/// Errors raised by a settings store.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A key-value store of JSON values.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    /// Removes a key. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

/// Settings kept in a single JSON object file.
///
/// The file is read once on open. Every write rewrites the whole file through
/// a temporary sibling that is renamed into place, so a crash never leaves a
/// truncated file behind.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileSettings {
    pub const FILE_NAME: &'static str = "settings.json";

    /// Opens the settings file, starting empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| SettingsError::Format {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file yet");
                BTreeMap::new()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    async fn write(&self, values: &BTreeMap<String, Value>) -> Result<(), SettingsError> {
        let io_err = |source: io::Error| SettingsError::Io {
            path: self.path.clone(),
            source,
        };

        let content = serde_json::to_string_pretty(values).map_err(|source| {
            SettingsError::Format {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await.map_err(io_err)?;
        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettings {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.values.lock().await;
        let mut updated = values.clone();
        updated.insert(key.to_string(), value);
        self.write(&updated).await?;
        *values = updated;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let mut values = self.values.lock().await;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut updated = values.clone();
        updated.remove(key);
        self.write(&updated).await?;
        *values = updated;
        Ok(())
    }
}

/// Settings that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}
