//! Library configuration management.
//!
//! This module handles loading and saving the configuration, which
//! includes the remote endpoint URLs and the media cache budgets.
//!
//! Configuration is stored at `~/.config/quizcache/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/store/cache directory paths
const APP_NAME: &str = "quizcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default endpoint for the countries reference list
const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all";

/// Default endpoint for the quiz content list
const DEFAULT_QUIZ_URL: &str = "https://6789df4ddd587da7ac27e4c2.mockapi.io/api/v1/mcq/content";

/// Default maximum number of media blobs held in memory
const DEFAULT_MEDIA_ITEM_LIMIT: usize = 100;

/// Default memory budget for cached media, in bytes (50MB)
const DEFAULT_MEDIA_COST_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub countries_url: String,
    pub quiz_url: String,
    pub media_item_limit: usize,
    pub media_cost_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            quiz_url: DEFAULT_QUIZ_URL.to_string(),
            media_item_limit: DEFAULT_MEDIA_ITEM_LIMIT,
            media_cost_limit: DEFAULT_MEDIA_COST_LIMIT,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted record tables.
    pub fn store_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("store"))
    }

    /// Directory holding the durable tier of the media cache.
    pub fn media_cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("media"))
    }
}
