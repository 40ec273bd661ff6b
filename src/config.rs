//! Process configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `WEBHOOK_CERT_PATH` | `/etc/webhook/certs/tls.crt` |
//! | `WEBHOOK_KEY_PATH` | `/etc/webhook/certs/tls.key` |
//! | `WEBHOOK_PORT` | `9443` |
//! | `HEALTH_PORT` | `8080` |
//! | `DISABLED_POLICIES` | empty (comma-separated policy names) |

use thiserror::Error;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health server port
pub const HEALTH_PORT: u16 = 8080;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the webhook process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub cert_path: String,
    pub key_path: String,
    pub webhook_port: u16,
    pub health_port: u16,
    /// Policy names excluded from evaluation
    pub disabled_policies: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            cert_path: WEBHOOK_CERT_PATH.to_string(),
            key_path: WEBHOOK_KEY_PATH.to_string(),
            webhook_port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            disabled_policies: Vec::new(),
        }
    }
}

impl WebhookConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            cert_path: lookup("WEBHOOK_CERT_PATH").unwrap_or(defaults.cert_path),
            key_path: lookup("WEBHOOK_KEY_PATH").unwrap_or(defaults.key_path),
            webhook_port: parse_port("WEBHOOK_PORT", lookup("WEBHOOK_PORT"))?
                .unwrap_or(defaults.webhook_port),
            health_port: parse_port("HEALTH_PORT", lookup("HEALTH_PORT"))?
                .unwrap_or(defaults.health_port),
            disabled_policies: lookup("DISABLED_POLICIES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        })
    }
}

fn parse_port(name: &'static str, value: Option<String>) -> Result<Option<u16>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.trim().parse::<u16>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "port must be non-zero".to_string(),
        }),
        Ok(port) => Ok(Some(port)),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
