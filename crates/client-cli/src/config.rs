use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Environment variable overriding the configured backend
pub const API_URL_ENV: &str = "EMBY_PORTAL_API_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    /// Upper bound for any single request, so a view never loads forever
    pub timeout_secs: Option<u64>,
}

impl Config {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "embygalaxy", "emby-portal")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Where the session cookie jar is persisted
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    pub fn log_dir() -> Result<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let cache_dir = proj_dirs.cache_dir();
        std::fs::create_dir_all(cache_dir)?;
        Ok(cache_dir.to_path_buf())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Backend base URL: command-line flag, then environment, then config
    /// file, then the default.
    pub fn api_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
            .or_else(|| self.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// A zero in the file (hand-edited) reads as the default
    pub fn timeout(&self) -> Duration {
        let secs = self.api.timeout_secs.filter(|s| *s > 0).unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Parse and store a request timeout. Zero would make every request
    /// time out at once, so it is refused.
    pub fn set_timeout_secs(&mut self, value: &str) -> Result<()> {
        let secs: u64 = value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("timeout_secs must be a whole number"))?;
        if secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        self.api.timeout_secs = Some(secs);
        Ok(())
    }
}
