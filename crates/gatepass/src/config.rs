//! Configuration management for gatepass.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::qr::{QrStore, DEFAULT_MODULE_SIZE};
use crate::storage::Storage;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "gatepass";

/// Prefix of environment variables that override configuration.
const ENV_PREFIX: &str = "GATEPASS_";

/// First path segments owned by application routes.
const RESERVED_SEGMENTS: &[&str] = &["start", "register", "profile"];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GATEPASS_`, sections split on `__`)
/// 2. TOML config file at `~/.config/gatepass/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// QR artifact configuration.
    pub qr: QrConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Fixed public origin (e.g. `https://gate.example.com`) used for profile
    /// URLs instead of the origin of the incoming request.
    pub public_url: Option<String>,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// How long a request waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

/// QR artifact configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Directory QR images are written to.
    pub directory: PathBuf,
    /// URL path QR images are served under.
    pub url_prefix: String,
    /// Pixels per QR module.
    pub module_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            public_url: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("database.db"),
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static/qrcodes"),
            url_prefix: "/static/qrcodes".to_string(),
            module_size: DEFAULT_MODULE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(Self::figment(&config_file))
    }

    /// The provider stack used by [`Config::load_from`].
    #[must_use]
    pub fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from a figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::config_validation("server.port must be greater than 0"));
        }

        if let Some(url) = &self.server.public_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::config_validation(format!(
                    "server.public_url must start with http:// or https://: {url}"
                )));
            }
        }

        if self.qr.module_size == 0 {
            return Err(Error::config_validation("qr.module_size must be greater than 0"));
        }

        if !self.qr.url_prefix.starts_with('/') || self.qr_url_prefix().is_empty() {
            return Err(Error::config_validation(format!(
                "qr.url_prefix must be a path below '/': {}",
                self.qr.url_prefix
            )));
        }

        let first_segment = self
            .qr_url_prefix()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        if RESERVED_SEGMENTS.contains(&first_segment) {
            return Err(Error::config_validation(format!(
                "qr.url_prefix overlaps the /{first_segment} route: {}",
                self.qr.url_prefix
            )));
        }

        Ok(())
    }

    /// Socket address the server binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                Error::config_validation(format!(
                    "server.host is not a valid IP address: {}",
                    self.server.host
                ))
            })
    }

    /// Public origin without a trailing slash, if one is configured.
    #[must_use]
    pub fn public_origin(&self) -> Option<&str> {
        self.server
            .public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
    }

    /// Origin used when no request is available (e.g. from the CLI).
    #[must_use]
    pub fn fallback_origin(&self) -> String {
        self.public_origin().map_or_else(
            || format!("http://{}:{}", self.server.host, self.server.port),
            ToString::to_string,
        )
    }

    /// URL prefix for QR images without a trailing slash.
    #[must_use]
    pub fn qr_url_prefix(&self) -> &str {
        self.qr.url_prefix.trim_end_matches('/')
    }

    /// Get the busy timeout as a Duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    /// Open the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open_storage(&self) -> Result<Storage> {
        Storage::open_with_timeout(&self.storage.database_path, self.busy_timeout())
    }

    /// Build the configured QR store.
    #[must_use]
    pub fn qr_store(&self) -> QrStore {
        QrStore::new(&self.qr.directory).with_module_size(self.qr.module_size)
    }
}
