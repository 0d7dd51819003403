use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};
use tracing::{error, info};

use crate::error::PollError;

pub const DEFAULT_MODEM_ADDRESS: &str = "10.1.10.1";
pub const DEFAULT_MODEM_USERNAME: &str = "cusadmin";
pub const DEFAULT_MODEM_PASSWORD: &str = "highspeed";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Where the modem lives and how to log in. Every key is optional in the TOML file.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollerConfig {
    /// Host, optionally with a port, of the modem's web interface.
    pub address: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_MODEM_ADDRESS.to_string(),
            username: DEFAULT_MODEM_USERNAME.to_string(),
            password: DEFAULT_MODEM_PASSWORD.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollerConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Settings given on the command line; each one set here wins over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerOverrides {
    pub address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl PollerConfig {
    /// Applies `overrides` on top of this config and validates the result.
    pub fn with_overrides(mut self, overrides: PollerOverrides) -> Result<Self, PollError> {
        if let Some(address) = overrides.address {
            self.address = address;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(timeout_seconds) = overrides.timeout_seconds {
            self.timeout_seconds = timeout_seconds;
        }
        self.validate()?;
        Ok(self)
    }

    /// Rejects an empty address or a zero request timeout.
    pub fn validate(&self) -> Result<(), PollError> {
        if self.address.trim().is_empty() {
            return Err(PollError::InvalidConfig("address must not be empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(PollError::InvalidConfig(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The modem only speaks plain HTTP.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address.trim_end_matches('/'))
    }
}

pub fn load_config(config_path: &Path) -> Result<PollerConfig, PollError> {
    info!(path = ?config_path, "Loading poller config.");

    let config_str = fs::read_to_string(config_path).map_err(|e| {
        error!(path = ?config_path, error = %e, "Failed to read poller config file.");
        PollError::Read {
            path: config_path.to_path_buf(),
            source: e,
        }
    })?;

    let config: PollerConfig = toml::from_str(&config_str).map_err(|e| {
        error!(path = ?config_path, error = %e, "Failed to parse poller config file.");
        PollError::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        }
    })?;

    config.validate().inspect_err(|e| {
        error!(path = ?config_path, error = %e, "Poller config file is invalid.");
    })?;

    info!(config = ?config, "Loaded config successfully.");
    Ok(config)
}
