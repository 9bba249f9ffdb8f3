//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The database URL is wrapped in `secrecy::SecretString` to keep it out of logs.

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub publishing: PublishingSettings,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            publishing: PublishingSettings::from_env()?,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Which save handler the dispatch point installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Replace the stock handler with the gatekeeper.
    #[default]
    Gatekeeper,
    /// Keep the stock handler.
    Stock,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerKind::Gatekeeper => "gatekeeper",
            HandlerKind::Stock => "stock",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for HandlerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gatekeeper" => Ok(HandlerKind::Gatekeeper),
            "stock" => Ok(HandlerKind::Stock),
            other => Err(Error::Config(format!("unknown save handler: {other}"))),
        }
    }
}

/// Publishing switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishingSettings {
    /// `false` when the license does not cover publishing.
    pub enabled: bool,
    pub save_handler: HandlerKind,
}

impl Default for PublishingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            save_handler: HandlerKind::Gatekeeper,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    publishing: PublishingSettings,
}

impl PublishingSettings {
    /// Read `PUBLISHING_ENABLED` and `SAVE_HANDLER`; unset vars keep defaults.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Ok(value) = std::env::var("PUBLISHING_ENABLED") {
            settings.enabled = parse_bool("PUBLISHING_ENABLED", &value)?;
        }
        if let Ok(value) = std::env::var("SAVE_HANDLER") {
            settings.save_handler = value.parse()?;
        }
        Ok(settings)
    }

    /// Load the `[publishing]` table of a TOML settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("bad settings file {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: SettingsFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(file.publishing)
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name} must be a boolean, got {other:?}"))),
    }
}
