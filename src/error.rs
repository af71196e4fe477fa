//! Error types for the email webhook.

use axum::http::StatusCode;
use serde_json::Value;

/// Every way a send request can fail.
///
/// All variants are terminal for the request; the handler turns each one
/// into a JSON envelope exactly once.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Email service is not configured: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Email provider rejected the message (status {status})")]
    Provider { status: u16, details: Value },

    #[error("{0}")]
    Unexpected(String),
}

impl SendError {
    pub fn unexpected(reason: impl std::fmt::Display) -> Self {
        Self::Unexpected(reason.to_string())
    }

    /// HTTP status the handler answers with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Provider { .. } | Self::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Extra detail attached to the `details` field of the error envelope.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Provider { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// Problems with the inbound request; always answered with 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Field `data` must be a JSON object")]
    DataNotObject,

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Unsupported email type: {0}")]
    UnsupportedType(String),

    #[error("Invalid data for {email_type} email: {reason}")]
    InvalidData { email_type: String, reason: String },
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
