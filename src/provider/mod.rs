//! Outbound email transport.
//!
//! The handler only sees the [`EmailTransport`] trait so tests can swap in
//! a fake and count calls. [`ResendTransport`] is the production
//! implementation.

pub mod resend;

pub use resend::ResendTransport;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SendError;

/// A composed message, as handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// The provider's acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderReceipt {
    pub id: String,
}

/// Something that can deliver an [`OutboundEmail`].
///
/// One call per valid request; implementations must not retry.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Short provider name, used in logs.
    fn name(&self) -> &str;

    async fn send(&self, email: &OutboundEmail) -> Result<ProviderReceipt, SendError>;
}
