// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use tokio::fs;

use shiftsync_core::{APP_NAME, Config as CoreConfig, get_config_dir};

const SHIFTSYNC_CONFIG_ENV: &str = "SHIFTSYNC_CONFIG";
const SHIFTSYNC_DEV_ENV: &str = "SHIFTSYNC_DEV";

const DEV_VALID_TRUE: &[&str] = &["1", "true", "yes"];
const DEV_VALID_FALSE: &[&str] = &["0", "false", "no"];

/// Loads the configuration.
///
/// Lookup order is the `--config` flag, then `SHIFTSYNC_CONFIG`, then
/// `<config dir>/shiftsync/config.toml`. An explicitly named file must exist;
/// a missing default file means built-in defaults.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<(CoreConfig, Config), Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(SHIFTSYNC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        if let Some(true) = is_dev_mode() {
            return Err(format!(
                "Development environment detected ({SHIFTSYNC_DEV_ENV} is set): config must be explicitly specified via --config or {SHIFTSYNC_CONFIG_ENV} environment variable",
            ).into());
        }

        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            tracing::debug!(path = %config.display(), "no config file, using defaults");
            return Ok((CoreConfig::default(), Config::default()));
        }
        config
    };

    let raw = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()
        .map_err(|e| format!("Failed to parse config file at {}: {}", path.display(), e))?;
    Ok((raw.core, raw.cli))
}

/// Settings of the command-line front end, the `[cli]` table.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracing filter used when `RUST_LOG` is unset, e.g. `"info"` or `"shiftsync_core=debug"`.
    pub log: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    core: CoreConfig,

    #[serde(default)]
    cli: Config,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn is_dev_mode() -> Option<bool> {
    let val = std::env::var(SHIFTSYNC_DEV_ENV).ok()?;
    let lower = val.to_lowercase();
    if DEV_VALID_TRUE.contains(&lower.as_str()) {
        Some(true)
    } else if DEV_VALID_FALSE.contains(&lower.as_str()) {
        Some(false)
    } else {
        tracing::warn!(
            "Unrecognized value for {}: '{}'. Expected one of: true: {}, false: {}. Treating as unset.",
            SHIFTSYNC_DEV_ENV,
            val,
            DEV_VALID_TRUE.join(", "),
            DEV_VALID_FALSE.join(", ")
        );
        None
    }
}
