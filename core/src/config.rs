// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::time::Duration;

use jiff::tz::TimeZone;
use shiftsync_feed::{FetchConfig, UrlPolicy};
use thiserror::Error;

/// The name of the application.
pub const APP_NAME: &str = "shiftsync";

const DATABASE_FILE: &str = "shiftsync.db";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("User-specific home directory not found")]
    HomeDirNotFound,

    #[error("User-specific config directory not found")]
    ConfigDirNotFound,

    #[error("User-specific state directory not found")]
    StateDirNotFound,

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Unknown time zone `{name}`: {source}")]
    UnknownTimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
}

/// Core configuration, the `[core]` table of the config file.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// Directory for storing application state. Without one the database lives in memory.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// IANA name of the zone feed times are shown in. Defaults to the system zone.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Sync subsystem settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Normalize the configuration.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        match &self.state_dir {
            Some(a) => self.state_dir = Some(expand_path(a)?),
            None => match get_state_dir() {
                Ok(a) => self.state_dir = Some(a.join(APP_NAME)),
                Err(e) => tracing::warn!("Failed to get state directory: {e}"),
            },
        };

        // fail early on a misspelled zone rather than on the first sync
        self.timezone()?;
        Ok(())
    }

    /// The local zone used for feed dates and wall-clock times.
    pub fn timezone(&self) -> Result<TimeZone, ConfigError> {
        match &self.timezone {
            Some(name) => TimeZone::get(name).map_err(|source| ConfigError::UnknownTimeZone {
                name: name.clone(),
                source,
            }),
            None => Ok(TimeZone::system()),
        }
    }

    /// Path of the database file, if a state directory is configured.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.state_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
    }
}

/// The `[core.sync]` table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between scheduler ticks.
    pub tick_secs: u64,

    /// Bound on one feed download.
    pub fetch_timeout_secs: u64,

    /// Bound on one storage transaction.
    pub storage_timeout_secs: u64,

    /// Log entries kept per feed; `0` keeps everything.
    pub log_retention: u32,

    /// Interval given to feeds created without one.
    pub default_interval_minutes: u32,

    /// Pending change notifications before new ones are dropped.
    pub change_bus_capacity: usize,

    pub allowed_schemes: Vec<String>,

    pub allowed_host_suffixes: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            fetch_timeout_secs: 30,
            storage_timeout_secs: 10,
            log_retention: 100,
            default_interval_minutes: 60,
            change_bus_capacity: 64,
            allowed_schemes: vec!["https".to_string(), "webcal".to_string()],
            allowed_host_suffixes: vec!["icloud.com".to_string()],
        }
    }
}

impl SyncConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs.max(1))
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs.max(1))
    }

    pub fn url_policy(&self) -> UrlPolicy {
        UrlPolicy::new(&self.allowed_schemes, &self.allowed_host_suffixes)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_secs: self.fetch_timeout_secs.max(1),
            ..FetchConfig::default()
        }
    }
}

/// Handle tilde (~) and environment variables in the path
fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| ConfigError::InvalidPath(path.to_owned()))?;

    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = path_str.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    let state_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_STATE_HOME/", "${XDG_STATE_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in state_prefixes {
        if let Some(stripped) = path_str.strip_prefix(prefix) {
            return Ok(get_state_dir()?.join(stripped));
        }
    }

    Ok(path.to_owned())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)
}

/// The user config directory, e.g. `$XDG_CONFIG_HOME`.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or(ConfigError::ConfigDirNotFound)
}

fn get_state_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let state_dir = xdg::BaseDirectories::new().get_state_home();
    #[cfg(not(unix))]
    let state_dir = dirs::data_local_dir();
    state_dir.ok_or(ConfigError::StateDirNotFound)
}
