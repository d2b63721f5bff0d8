//! Configuration management for ReportApp.
//!
//! Loads configuration from ${REPORTAPP_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geocode::{DEFAULT_GEOCODING_BASE_URL, GeocodeConfig};

/// Environment variable overriding the report service base URL.
pub const API_BASE_URL_ENV: &str = "REPORTAPP_API_BASE_URL";
/// Environment variable overriding the geocoding base URL.
pub const GEOCODING_BASE_URL_ENV: &str = "REPORTAPP_GEOCODING_BASE_URL";
/// Environment variable holding the geocoding API key.
pub const GEOCODING_API_KEY_ENV: &str = "REPORTAPP_GEOCODING_API_KEY";

pub mod paths {
    //! Path resolution for ReportApp configuration and data.
    //!
    //! REPORTAPP_HOME resolution order:
    //! 1. REPORTAPP_HOME environment variable (if set)
    //! 2. ~/.config/reportapp (default)

    use std::path::PathBuf;

    /// Returns the ReportApp home directory.
    pub fn reportapp_home() -> PathBuf {
        if let Ok(home) = std::env::var("REPORTAPP_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".reportapp"),
            |h| h.join(".config").join("reportapp"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        reportapp_home().join("config.toml")
    }

    /// Returns the path of the persisted session token.
    pub fn session_path() -> PathBuf {
        reportapp_home().join("session.json")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Reverse geocoding configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Provider base URL (defaults to the Google Maps API host)
    pub base_url: Option<String>,
    /// Provider API key
    pub api_key: Option<String>,
    /// Preferred language for formatted addresses
    pub language: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the report service
    pub api_base_url: String,

    /// Whether `/type-list` is called with the bearer token
    pub categories_require_auth: bool,

    /// Reverse geocoding settings
    pub geocoding: GeocodingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            categories_require_auth: false,
            geocoding: GeocodingConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves only the `api_base_url` field to the default config file.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_api_base_url(url: &str) -> Result<()> {
        Self::save_api_base_url_to(&paths::config_path(), url)
    }

    /// Saves only the `api_base_url` field to a specific config file path.
    ///
    /// Creates the file from the template if it doesn't exist.
    /// Preserves existing fields and comments using toml_edit.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the file cannot be written.
    pub fn save_api_base_url_to(path: &Path, url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        validate_url(url, "API")?;

        let contents = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["api_base_url"] = value(url.trim_end_matches('/'));

        Self::write_config(path, &doc.to_string())
    }

    /// Effective report service base URL (env > config > default), without a trailing slash.
    ///
    /// # Errors
    /// Returns an error if the resolved URL does not parse.
    pub fn resolved_api_base_url(&self) -> Result<String> {
        resolve_base_url(
            Some(&self.api_base_url),
            API_BASE_URL_ENV,
            Self::DEFAULT_API_BASE_URL,
            "API",
        )
    }

    /// Builds the geocoder settings from config and environment.
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn geocode_config(&self) -> Result<GeocodeConfig> {
        let api_key = resolve_api_key(
            self.geocoding.api_key.as_deref(),
            GEOCODING_API_KEY_ENV,
            "geocoding",
        )?;
        let base_url = resolve_base_url(
            self.geocoding.base_url.as_deref(),
            GEOCODING_BASE_URL_ENV,
            DEFAULT_GEOCODING_BASE_URL,
            "geocoding",
        )?;

        Ok(GeocodeConfig {
            base_url,
            api_key,
            language: self
                .geocoding
                .language
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        })
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Resolves an API key with precedence: config > env.
///
/// # Errors
/// Returns an error if neither source provides a non-empty key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let key = std::env::var(env_var).context(format!(
        "No API key available. Set {env_var} or api_key in [{config_section}]."
    ))?;
    let trimmed = key.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{env_var} is set but empty");
    }
    Ok(trimmed.to_string())
}

/// Resolves a base URL with precedence: env > config > default.
///
/// The returned URL never ends with `/`.
///
/// # Errors
/// Returns an error if the chosen URL is malformed.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    service_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, service_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, service_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.trim_end_matches('/').to_string())
}

fn validate_url(url: &str, service_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {service_name} base URL: {url}"))?;
    Ok(())
}
