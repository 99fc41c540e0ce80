//! Application configuration.
//!
//! The only setting this core needs is the identity service base URL. It is
//! resolved once at startup: the `API_URL` environment variable (a `.env`
//! file is honored) wins over `~/.config/gatehouse/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

/// Application name used for the config directory path
const APP_NAME: &str = "gatehouse";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming the identity service base URL
const API_URL_ENV: &str = "API_URL";

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_url = std::env::var(API_URL_ENV).ok();
        let file = Self::read_file()?;
        Self::resolve(env_url, file.api_url)
    }

    fn resolve(env_url: Option<String>, file_url: Option<String>) -> Result<Self> {
        let api_url = env_url
            .filter(|u| !u.trim().is_empty())
            .or(file_url)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no identity service URL configured (set {} or add api_url to the config file)",
                    API_URL_ENV
                )
            })?;
        Ok(Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
        })
    }

    fn read_file() -> Result<ConfigFile> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(ConfigFile::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
