//! Application configuration
//!
//! Loaded from `<config dir>/youarehere/config.toml` (or a path given on
//! the command line), then overridden from the environment:
//!
//! ```toml
//! proxy-base-url = "https://proxy.example.com"
//! client-api-key = "..."
//!
//! [location]
//! latitude = 48.8584
//! longitude = 2.2945
//!
//! [narration]
//! refresh-interval-ticks = 30
//! ```

use crate::location::{Coordinates, DEFAULT_NOMINATIM_URL};
use crate::narration::NarrationConfig;
use crate::{Result, YouAreHereError};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding `proxy-base-url`
pub const PROXY_BASE_URL_ENV: &str = "YOUAREHERE_PROXY_BASE_URL";

/// Environment variable overriding `client-api-key`
pub const CLIENT_API_KEY_ENV: &str = "YOUAREHERE_CLIENT_API_KEY";

/// A fixed position to narrate, instead of a live location source
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationConfig {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Top-level configuration
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    /// Base URL of the summary/speech proxy
    pub proxy_base_url: String,

    /// Key sent as `x-client-key` to the summary endpoint
    pub client_api_key: String,

    /// Nominatim-compatible reverse geocoding service
    pub geocoder_url: String,

    pub request_timeout_secs: u64,

    pub location: Option<LocationConfig>,

    pub narration: NarrationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: String::new(),
            client_api_key: String::new(),
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            request_timeout_secs: 30,
            location: None,
            narration: NarrationConfig::default(),
        }
    }
}

// The client key stays out of logs
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("proxy_base_url", &self.proxy_base_url)
            .field("client_api_key", &"<redacted>")
            .field("geocoder_url", &self.geocoder_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("location", &self.location)
            .field("narration", &self.narration)
            .finish()
    }
}

impl AppConfig {
    /// Parse configuration from TOML text (no validation)
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| YouAreHereError::ConfigError(format!("invalid config: {}", e)))
    }

    /// Load, apply environment overrides and validate
    ///
    /// An explicit `path` must exist. The default path may be missing, in
    /// which case everything has to come from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                Some(path) => {
                    debug!("No config file at {}, using defaults", path.display());
                    Self::default()
                }
                None => Self::default(),
            },
        };

        let config = config.with_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            YouAreHereError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            YouAreHereError::ConfigError(format!("invalid config at {}: {}", path.display(), e))
        })
    }

    /// The default config file path: `<config dir>/youarehere/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("youarehere").join("config.toml"))
    }

    /// Override the proxy URL and client key from `lookup` (normally the environment)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(PROXY_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.proxy_base_url = url;
        }
        if let Some(key) = lookup(CLIENT_API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.client_api_key = key;
        }
        self
    }

    /// Set a fixed location, replacing any configured one
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(LocationConfig { latitude, longitude });
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let url = self.proxy_base_url.trim();
        if url.is_empty() {
            return Err(YouAreHereError::ConfigError(format!(
                "proxy-base-url is not set (config file or {})",
                PROXY_BASE_URL_ENV
            )));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(YouAreHereError::ConfigError(format!(
                "proxy-base-url must be an http(s) URL, got {}",
                url
            )));
        }
        if self.client_api_key.trim().is_empty() {
            return Err(YouAreHereError::ConfigError(format!(
                "client-api-key is not set (config file or {})",
                CLIENT_API_KEY_ENV
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(YouAreHereError::ConfigError(
                "request-timeout-secs must be at least 1".to_string(),
            ));
        }
        if let Some(location) = &self.location {
            if !location.coordinates().is_valid() {
                return Err(YouAreHereError::ConfigError(format!(
                    "invalid location {}, {}",
                    location.latitude, location.longitude
                )));
            }
        }

        self.narration.validate().map_err(YouAreHereError::ConfigError)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.as_ref().map(LocationConfig::coordinates)
    }
}
