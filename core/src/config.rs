// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::settings::JsonFileSettings;

/// The name of the application.
pub const APP_NAME: &str = "contactsync";

const DATABASE_FILE: &str = "contacts.db";
const DEVICE_FILE: &str = "device.json";

/// Configuration for contact syncing.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// Directory for the contact cache and the settings file. Without one,
    /// everything is kept in memory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// JSON snapshot standing in for the device contact store.
    #[serde(default)]
    pub device_path: Option<PathBuf>,
}

impl Config {
    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), Box<dyn Error>> {
        // Normalize state directory
        match &self.state_dir {
            Some(a) => {
                self.state_dir = Some(
                    expand_path(a)
                        .map_err(|e| format!("Failed to expand state directory path: {e}"))?,
                )
            }

            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!(err = %e, "failed to get state directory"),
            },
        };

        // Normalize device snapshot path
        self.device_path = match (&self.device_path, &self.state_dir) {
            (Some(a), _) => Some(
                expand_path(a).map_err(|e| format!("Failed to expand device path: {e}"))?,
            ),
            (None, Some(state_dir)) => Some(state_dir.join(DEVICE_FILE)),
            (None, None) => None,
        };

        Ok(())
    }

    /// Path of the contact cache database, if state is kept on disk.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|a| a.join(DATABASE_FILE))
    }

    /// Path of the settings file, if state is kept on disk.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.state_dir
            .as_ref()
            .map(|a| a.join(JsonFileSettings::FILE_NAME))
    }
}

/// Handle tilde (~) and environment variables in the path
pub fn expand_path(path: &Path) -> Result<PathBuf, Box<dyn Error>> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path = path.to_str().ok_or("Invalid path")?;

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = path.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.into())
}

fn get_home_dir() -> Result<PathBuf, Box<dyn Error>> {
    dirs::home_dir().ok_or("User-specific home directory not found".into())
}

/// The user-specific configuration directory.
pub fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(windows)]
    let config_dir = dirs::config_dir();
    config_dir.ok_or("User-specific config directory not found".into())
}

fn get_state_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(windows)]
    let state_dir = dirs::data_dir();
    state_dir.ok_or("User-specific state directory not found".into())
}
