//! Resend transport — `POST /emails` with bearer auth.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use super::{EmailTransport, OutboundEmail, ProviderReceipt};
use crate::config::ResendConfig;
use crate::error::{ConfigError, SendError};

/// Resend HTTPS API client.
pub struct ResendTransport {
    api_key: Option<SecretString>,
    base_url: String,
    client: reqwest::Client,
}

/// Wire body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

impl<'a> From<&'a OutboundEmail> for SendEmailBody<'a> {
    fn from(email: &'a OutboundEmail) -> Self {
        Self {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        }
    }
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: ResendConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<ProviderReceipt, SendError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("RESEND_API_KEY".into()))?;

        let resp = self
            .client
            .post(self.api_url("emails"))
            .bearer_auth(api_key.expose_secret())
            .json(&SendEmailBody::from(email))
            .send()
            .await
            .map_err(|e| SendError::unexpected(format!("Resend request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SendError::unexpected(format!("Failed to read Resend response: {e}")))?;

        if !status.is_success() {
            return Err(SendError::Provider {
                status: status.as_u16(),
                details: error_details(&text),
            });
        }

        serde_json::from_str::<ProviderReceipt>(&text).map_err(|e| {
            SendError::unexpected(format!("Invalid response from Resend: {e}"))
        })
    }
}

/// Keep the provider's JSON error as-is; wrap anything else.
fn error_details(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => serde_json::json!({ "message": body.trim() }),
    }
}
