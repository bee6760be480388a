//! Configuration for twofa-rs
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file, then `TWOFA_*` environment variables (`TWOFA_TOTP__WINDOW=2`).

use crate::error::{Result, TwofaError};
use crate::mfa::totp::MAX_WINDOW;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Issuer shown in authenticator apps when the caller does not name one
pub const DEFAULT_ISSUER: &str = "School Manager";

/// Third-party endpoint that renders a QR image from its `data` parameter
pub const DEFAULT_QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=";

const MAX_BACKUP_CODES: usize = 100;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub totp: TotpConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TOTP verification settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TotpConfig {
    /// Issuer name (shown in authenticator apps)
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Accepted clock drift, in time steps either side of the current one
    #[serde(default = "default_window")]
    pub window: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    /// Number of codes per generated batch
    #[serde(default = "default_backup_count")]
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QrConfig {
    /// Prefix the percent-encoded otpauth URL is appended to
    #[serde(default = "default_qr_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}

fn default_window() -> u64 {
    1
}

fn default_backup_count() -> usize {
    10
}

fn default_qr_endpoint() -> String {
    DEFAULT_QR_ENDPOINT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            window: default_window(),
        }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            count: default_backup_count(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_qr_endpoint(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Parse a TOML file, with no environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Config =
            toml::from_str(&content).map_err(|e| TwofaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve defaults, then the optional file, then `TWOFA_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: Config = builder
            .add_source(
                ::config::Environment::with_prefix("TWOFA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.totp.window > MAX_WINDOW {
            return Err(TwofaError::Config(format!(
                "totp.window must be at most {}, got {}",
                MAX_WINDOW, self.totp.window
            )));
        }

        if self.backup.count == 0 || self.backup.count > MAX_BACKUP_CODES {
            return Err(TwofaError::Config(format!(
                "backup.count must be between 1 and {}, got {}",
                MAX_BACKUP_CODES, self.backup.count
            )));
        }

        if self.qr.endpoint.trim().is_empty() {
            return Err(TwofaError::Config("qr.endpoint must not be empty".to_string()));
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(TwofaError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.totp.issuer, DEFAULT_ISSUER);
        assert_eq!(config.totp.window, 1);
        assert_eq!(config.backup.count, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[totp]\nwindow = 2\n").unwrap();
        assert_eq!(config.totp.window, 2);
        assert_eq!(config.totp.issuer, DEFAULT_ISSUER);
        assert_eq!(config.qr.endpoint, DEFAULT_QR_ENDPOINT);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.totp.window = 11;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backup.count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.qr.endpoint = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
