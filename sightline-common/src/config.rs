//! Bootstrap configuration
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (applied by the binary through clap)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: the service starts on defaults and
//! the caller logs a warning. A file that exists but cannot be parsed is a
//! [`Error::Config`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable naming the TOML file
pub const CONFIG_ENV_VAR: &str = "SIGHTLINE_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub validation: ValidationConfig,
    pub notifications: NotificationConfig,
    /// Outgoing mail; absent means notifications are only logged
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file; defaults to [`default_database_path`]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Sighting acceptance rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reports strictly closer than this to the reference point are rejected
    pub min_distance_meters: f64,
    /// Reject observation times after "now"
    pub reject_future: bool,
    /// Reject observation times not later than the reference record
    pub require_after_reference: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_distance_meters: 5000.0,
            reject_future: true,
            require_after_reference: true,
        }
    }
}

/// Notification fan-out settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Upper bound for a single recipient's delivery
    pub dispatch_timeout_ms: u64,
    /// Mail template used for sighting notifications
    pub template: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: 5000,
            template: "sighting_notification".to_string(),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// From address, e.g. `Sightline <alerts@example.org>`
    pub sender: String,
    #[serde(default = "default_starttls")]
    pub starttls: bool,
    #[serde(default = "default_smtp_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

fn default_smtp_timeout_ms() -> u64 {
    5000
}

impl TomlConfig {
    /// Load from `path`; `Ok(None)` if the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Some(config))
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let min = self.validation.min_distance_meters;
        if !min.is_finite() || min < 0.0 {
            return Err(Error::Config(format!(
                "validation.min_distance_meters must be a non-negative number (got {})",
                min
            )));
        }
        if self.notifications.dispatch_timeout_ms == 0 {
            return Err(Error::Config(
                "notifications.dispatch_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.notifications.template.trim().is_empty() {
            return Err(Error::Config("notifications.template must not be empty".to_string()));
        }
        Ok(())
    }

    /// Database path from the file, or the platform default
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Locate the configuration file
///
/// Explicit path, then `SIGHTLINE_CONFIG`, then the per-user config
/// directory (`~/.config/sightline/config.toml` on Linux).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir()
        .map(|d| d.join("sightline").join("config.toml"))
        .filter(|p| p.exists())
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sightline").join("sightline.db"))
        .unwrap_or_else(|| PathBuf::from("./sightline_data/sightline.db"))
}
