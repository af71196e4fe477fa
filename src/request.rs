//! Inbound request model — decoding and validation of `{type, to, data}`.

use serde::Deserialize;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::error::ValidationError;

/// A decoded, validated send request. Lives for one request only.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRequest {
    /// Template identifier, e.g. `welcome`.
    pub email_type: String,
    /// Recipient address.
    pub recipient: String,
    /// Template-specific payload.
    pub data: Map<String, Value>,
}

/// Wire shape before validation. Every field is optional so that all
/// missing fields can be reported together.
#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(rename = "type")]
    email_type: Option<Value>,
    to: Option<Value>,
    data: Option<Value>,
}

impl EmailRequest {
    /// Decode a request body.
    ///
    /// An empty body is treated as `{}` and therefore reports all three
    /// fields as missing.
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        let raw: RawRequest = if body.iter().all(u8::is_ascii_whitespace) {
            RawRequest::default()
        } else {
            let value: Value = serde_json::from_slice(body)
                .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
            if !value.is_object() {
                return Err(ValidationError::MalformedBody(
                    "expected a JSON object".into(),
                ));
            }
            serde_json::from_value(value)
                .map_err(|e| ValidationError::MalformedBody(e.to_string()))?
        };

        let email_type = non_empty_string(raw.email_type);
        let recipient = non_empty_string(raw.to);
        let data = match raw.data {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.is_empty() => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(ValidationError::DataNotObject),
        };

        let mut missing = Vec::new();
        if email_type.is_none() {
            missing.push("type");
        }
        if recipient.is_none() {
            missing.push("to");
        }
        if data.is_none() {
            missing.push("data");
        }

        match (email_type, recipient, data) {
            (Some(email_type), Some(recipient), Some(data)) => {
                if !recipient.validate_email() {
                    return Err(ValidationError::InvalidRecipient(recipient));
                }
                Ok(Self {
                    email_type,
                    recipient,
                    data,
                })
            }
            _ => Err(ValidationError::MissingFields(missing)),
        }
    }
}

fn non_empty_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}
