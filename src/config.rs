// File: src/config.rs
use crate::catalog::{CatalogSource, Latency, TransportApi};
use crate::paths::AppPaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://dummyjson.com";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_session_ttl() -> u32 {
    60
}

fn default_debounce_ms() -> u64 {
    300
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the auth API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub allow_insecure_certs: bool,

    /// Lifetime requested for login tokens, in minutes.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_mins: u32,

    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Delay catalog responses like a remote API would.
    #[serde(default = "default_true")]
    pub simulate_latency: bool,

    /// JSON route list to use instead of the built-in catalog.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            allow_insecure_certs: false,
            session_ttl_mins: default_session_ttl(),
            search_debounce_ms: default_debounce_ms(),
            simulate_latency: true,
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = AppPaths::get_config_file_path()?;
        if path.exists() {
            return Self::load_from(&path);
        }
        Err(anyhow::anyhow!("Config file not found"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::get_config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get_path_string() -> Result<String> {
        let path = AppPaths::get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn transport_api(&self) -> TransportApi {
        let source = match &self.catalog_path {
            Some(p) if !p.is_empty() => CatalogSource::File(PathBuf::from(p)),
            _ => CatalogSource::BuiltIn,
        };
        let latency = if self.simulate_latency {
            Latency::default()
        } else {
            Latency::none()
        };
        TransportApi::new(source, latency)
    }
}
