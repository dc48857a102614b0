use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::provider::{viacep, weatherapi};

pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const BIND_ENV: &str = "TEMPERATURE_BIND";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViaCepConfig {
    pub base_url: String,
}

impl Default for ViaCepConfig {
    fn default() -> Self {
        Self { base_url: viacep::DEFAULT_BASE_URL.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self { base_url: weatherapi::DEFAULT_BASE_URL.to_string(), api_key: None }
    }
}

/// Top-level configuration.
///
/// Example TOML:
/// ```toml
/// [server]
/// bind = "127.0.0.1:8080"
///
/// [weatherapi]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub viacep: ViaCepConfig,
    pub weatherapi: WeatherApiConfig,
}

impl Config {
    /// Load the config file (explicit path or the platform default), then
    /// `.env`, then the process environment.
    ///
    /// A missing API key is not an error here; it fails the requests that need it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_file_path()?;
                if path.exists() { Self::from_file(&path)? } else { Self::default() }
            }
        };

        // A missing .env is the common case.
        dotenv::dotenv().ok();
        cfg.apply_env(|name| std::env::var(name).ok());

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Overlay environment values; `lookup` is injected so tests stay off the real env.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.weatherapi.api_key = Some(key);
        }
        if let Some(bind) = lookup(BIND_ENV).filter(|b| !b.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "temperature", "temperature-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The WeatherAPI key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.weatherapi.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_public_services() {
        let cfg = Config::default();

        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.viacep.base_url, "https://viacep.com.br/ws");
        assert_eq!(cfg.weatherapi.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [weatherapi]
            api_key = "FROM_FILE"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.api_key(), Some("FROM_FILE"));
        assert_eq!(cfg.weatherapi.base_url, "https://api.weatherapi.com/v1");
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.weatherapi.api_key = Some("FROM_FILE".into());

        cfg.apply_env(env(&[(API_KEY_ENV, "FROM_ENV"), (BIND_ENV, "127.0.0.1:3000")]));

        assert_eq!(cfg.api_key(), Some("FROM_ENV"));
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.weatherapi.api_key = Some("FROM_FILE".into());

        cfg.apply_env(env(&[(API_KEY_ENV, ""), (BIND_ENV, " ")]));

        assert_eq!(cfg.api_key(), Some("FROM_FILE"));
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn blank_key_in_file_counts_as_absent() {
        let mut cfg = Config::default();
        cfg.weatherapi.api_key = Some(String::new());

        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn from_file_reports_path_on_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
