use crate::listing::{DirectoryLister, DEFAULT_IMAGE_EXTENSIONS};
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = ".imgseq";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Prefix used when `--prefix` is not given
    #[serde(default)]
    pub prefix: Option<String>,

    /// Default preview format: "table", "json", or "summary"
    #[serde(default = "default_preview")]
    pub preview_format: String,

    /// Whether to use color output by default (None = auto-detect)
    #[serde(default)]
    pub use_color: Option<bool>,

    /// Extensions (without the dot) treated as images
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Attempts per rename step, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay after the first failed attempt; doubles each retry
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Whether rename batches write a log under `<dir>/.imgseq/logs`
    #[serde(default = "default_true")]
    pub write_log: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            preview_format: default_preview(),
            use_color: None,
            extensions: default_extensions(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            write_log: true,
        }
    }
}

fn default_preview() -> String {
    "table".to_string()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| (*ext).to_string())
        .collect()
}

fn default_retry_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_retry_base_delay_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

impl DefaultsConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn lister(&self) -> DirectoryLister {
        DirectoryLister::with_extensions(&self.extensions)
    }
}

impl Config {
    /// Load config from .imgseq/config.toml if it exists
    pub fn load() -> Result<Self> {
        if let Ok(cwd) = std::env::current_dir() {
            let config_path = cwd.join(CONFIG_DIR_NAME).join("config.toml");
            if config_path.exists() {
                return Self::load_from_path(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to .imgseq/config.toml
    pub fn save(&self) -> Result<()> {
        let cwd = std::env::current_dir()?;
        let config_dir = cwd.join(CONFIG_DIR_NAME);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        self.save_to_path(&config_dir.join("config.toml"))
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
