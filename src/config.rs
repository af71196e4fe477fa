//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Resend API base URL.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Default sender used when `MAILHOOK_FROM` is unset.
pub const DEFAULT_FROM_ADDRESS: &str = "onboarding@resend.dev";

/// Default reply-to for student-facing mails when `MAILHOOK_REPLY_TO` is unset.
pub const DEFAULT_REPLY_TO: &str = "contact@statsecure-academy.com";

const DEFAULT_PORT: u16 = 3000;

/// Provider settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    /// Bearer token for the Resend API. `None` means sends fail with a
    /// configuration error instead of the process refusing to start.
    pub api_key: Option<SecretString>,
    /// Base URL, without the `/emails` path.
    pub base_url: String,
}

impl ResendConfig {
    pub fn from_env() -> Self {
        let api_key = std::env::var("RESEND_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let base_url = std::env::var("RESEND_API_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string());

        Self { api_key, base_url }
    }
}

/// Sender identity stamped on every outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub from_address: String,
    pub reply_to: Option<String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            reply_to: Some(DEFAULT_REPLY_TO.to_string()),
        }
    }
}

impl SenderConfig {
    pub fn from_env() -> Self {
        let from_address = std::env::var("MAILHOOK_FROM")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string());

        // Set but blank disables reply-to altogether.
        let reply_to = match std::env::var("MAILHOOK_REPLY_TO") {
            Ok(value) => Some(value.trim().to_string()).filter(|s| !s.is_empty()),
            Err(_) => Some(DEFAULT_REPLY_TO.to_string()),
        };

        Self {
            from_address,
            reply_to,
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub sender: SenderConfig,
    pub resend: ResendConfig,
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Only a malformed `MAILHOOK_PORT` is an error; a missing API key is
    /// reported per request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port(std::env::var("MAILHOOK_PORT").ok().as_deref())?;

        Ok(Self {
            port,
            sender: SenderConfig::from_env(),
            resend: ResendConfig::from_env(),
        })
    }
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_PORT),
        Some(value) => value.parse().map_err(|e| ConfigError::InvalidValue {
            key: "MAILHOOK_PORT".into(),
            message: format!("{value:?}: {e}"),
        }),
    }
}
