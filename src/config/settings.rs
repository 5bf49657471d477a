use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::store::DEFAULT_DIR;

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "VX3_CONFIG";

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Settings validation failed: {message}")]
    ValidationError { message: String },
}

/// Root settings container (`config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub payment: PaymentSettings,
    #[serde(default)]
    pub scaffold: ScaffoldSettings,
}

/// Endpoint store and JSON-RPC client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    /// Directory holding named endpoint configurations.
    #[serde(default = "default_rpc_dir")]
    pub dir: PathBuf,
    /// Total request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Dev server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_server_env")]
    pub env: String,
}

/// Receipt polling for payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettings {
    #[serde(default = "default_confirmations")]
    pub confirmations: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_seconds: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaffoldSettings {
    /// Directory holding one sub-directory per template.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

fn default_rpc_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DIR)
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_env() -> String {
    "development".to_string()
}

fn default_confirmations() -> u32 {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_receipt_timeout() -> u32 {
    120
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            dir: default_rpc_dir(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            env: default_server_env(),
        }
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            receipt_timeout_seconds: default_receipt_timeout(),
        }
    }
}

impl RpcSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_seconds))
    }
}

impl PaymentSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.receipt_timeout_seconds))
    }
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// `$VX3_CONFIG` when set, otherwise `vx3/config.toml` under
    /// `dirs::config_dir()`, falling back to the current directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("vx3").join("config.toml")
    }

    /// Loads settings from the default location.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads settings from `path`.
    ///
    /// - If the file doesn't exist, returns `Settings::default()`.
    /// - Otherwise parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings =
            toml::from_str(&content).map_err(|e| SettingsError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let fail = |message: &str| {
            Err(SettingsError::ValidationError {
                message: message.to_string(),
            })
        };

        if self.rpc.dir.as_os_str().is_empty() {
            return fail("rpc.dir must not be empty");
        }
        if self.rpc.timeout_seconds == 0 {
            return fail("rpc.timeout_seconds must be greater than 0");
        }
        if self.rpc.connect_timeout_seconds == 0 {
            return fail("rpc.connect_timeout_seconds must be greater than 0");
        }
        if self.payment.confirmations == 0 {
            return fail("payment.confirmations must be at least 1");
        }
        if self.payment.poll_interval_ms == 0 {
            return fail("payment.poll_interval_ms must be greater than 0");
        }
        Ok(())
    }
}
