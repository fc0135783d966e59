//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default PokeAPI endpoint
pub const DEFAULT_CATALOG_URL: &str = "https://pokeapi.co/api/v2";

/// Dexfinder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub search: SearchConfig,
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// How many list entries a search scans for name matches
    pub search_list_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub default_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub page_size: u32,
    pub coalesce_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            timeout_secs: 30,
            search_list_limit: 1000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_len: 2,
            default_limit: 5,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            coalesce_ms: 100,
        }
    }
}

impl CatalogConfig {
    /// Base URL with the `DEXFINDER_CATALOG_URL` override applied
    pub fn resolved_base_url(&self) -> String {
        env::var("DEXFINDER_CATALOG_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }
}

impl SearchConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl LoaderConfig {
    pub fn coalesce_interval(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }
}

const KEYS: [&str; 8] = [
    "catalog.base_url",
    "catalog.timeout_secs",
    "catalog.search_list_limit",
    "search.debounce_ms",
    "search.min_query_len",
    "search.default_limit",
    "loader.page_size",
    "loader.coalesce_ms",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("DEXFINDER_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("dexfinder")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.catalog.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(
                "catalog.base_url must start with http:// or https://, got '{}'",
                self.catalog.base_url
            ));
        }
        if self.catalog.search_list_limit == 0 {
            return Err(anyhow!("catalog.search_list_limit must be at least 1"));
        }
        if self.search.min_query_len == 0 {
            return Err(anyhow!("search.min_query_len must be at least 1"));
        }
        if self.search.default_limit == 0 {
            return Err(anyhow!("search.default_limit must be at least 1"));
        }
        if self.loader.page_size == 0 {
            return Err(anyhow!("loader.page_size must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "catalog.base_url" => Ok(self.catalog.base_url.clone()),
            "catalog.timeout_secs" => Ok(self.catalog.timeout_secs.to_string()),
            "catalog.search_list_limit" => Ok(self.catalog.search_list_limit.to_string()),

            "search.debounce_ms" => Ok(self.search.debounce_ms.to_string()),
            "search.min_query_len" => Ok(self.search.min_query_len.to_string()),
            "search.default_limit" => Ok(self.search.default_limit.to_string()),

            "loader.page_size" => Ok(self.loader.page_size.to_string()),
            "loader.coalesce_ms" => Ok(self.loader.coalesce_ms.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `dexfinder config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "catalog.base_url" => {
                let url = value.trim().trim_end_matches('/');
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(anyhow!("Catalog URL must start with http:// or https://"));
                }
                self.catalog.base_url = url.to_string();
            }
            "catalog.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("Timeout must be at least one second"));
                }
                self.catalog.timeout_secs = secs;
            }
            "catalog.search_list_limit" => {
                let limit: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid search_list_limit value: {}", value))?;
                if limit == 0 {
                    return Err(anyhow!("search_list_limit must be at least 1"));
                }
                self.catalog.search_list_limit = limit;
            }

            "search.debounce_ms" => {
                self.search.debounce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid debounce_ms value: {}", value))?;
            }
            "search.min_query_len" => {
                let len: usize = value
                    .parse()
                    .with_context(|| format!("Invalid min_query_len value: {}", value))?;
                if len == 0 {
                    return Err(anyhow!("min_query_len must be at least 1"));
                }
                self.search.min_query_len = len;
            }
            "search.default_limit" => {
                let limit: usize = value
                    .parse()
                    .with_context(|| format!("Invalid default_limit value: {}", value))?;
                if limit == 0 {
                    return Err(anyhow!("default_limit must be at least 1"));
                }
                self.search.default_limit = limit;
            }

            "loader.page_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid page_size value: {}", value))?;
                if size == 0 {
                    return Err(anyhow!("page_size must be at least 1"));
                }
                self.loader.page_size = size;
            }
            "loader.coalesce_ms" => {
                self.loader.coalesce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid coalesce_ms value: {}", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `dexfinder config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
