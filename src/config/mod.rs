// ABOUTME: User-level configuration for the edgeship CLI (config.yml).
// ABOUTME: Handles YAML parsing, discovery, defaults, and API token resolution.

mod env_value;
mod language;

pub use env_value::EnvValue;
pub use language::{GoConfig, LanguageConfig, RustConfig};

use crate::api::ApiToken;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "EDGESHIP_CONFIG";
/// Supplies the API token without a config file.
pub const TOKEN_ENV: &str = "EDGESHIP_API_TOKEN";
pub const CONFIG_FILENAME: &str = "config.yml";
pub const DEFAULT_API_ENDPOINT: &str = "https://api.fastly.com";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub language: LanguageConfig,

    #[serde(default)]
    pub status_check: StatusCheckConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub token: Option<EnvValue>,
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            endpoint: default_endpoint(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Build script timeout. Unset or zero means no timeout.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCheckConfig {
    #[serde(default = "default_status_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_status_path")]
    pub path: String,
}

fn default_status_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_status_path() -> String {
    "/".to_string()
}

impl Default for StatusCheckConfig {
    fn default() -> Self {
        StatusCheckConfig {
            timeout: default_status_timeout(),
            path: default_status_path(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the config file from its standard location, or defaults if there is none.
    ///
    /// An explicit `EDGESHIP_CONFIG` path must exist.
    pub fn discover() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            let path = PathBuf::from(explicit);
            if !path.is_file() {
                return Err(Error::ConfigNotFound(path));
            }
            return Self::load(&path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(config = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Config::default()),
        }
    }

    /// Resolve the API token: explicit flag, then `EDGESHIP_API_TOKEN`, then config.
    pub fn resolve_token(&self, flag: Option<&str>) -> Option<ApiToken> {
        flag.map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()))
            .or_else(|| self.api.token.as_ref().and_then(EnvValue::lookup))
            .map(ApiToken::new)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("edgeship").join(CONFIG_FILENAME))
}
