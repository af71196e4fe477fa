//! Email templates — a fixed registry from type identifier to render function.
//!
//! Each template takes a typed payload decoded from the request's `data`
//! object and produces a subject line plus an HTML body. The HTML lives in
//! `templates/*.html` and is compiled in by askama, which escapes every
//! interpolated value.

mod admin;
mod enrollment;
mod welcome;

use std::borrow::Cow;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{SendError, ValidationError};

/// Currency assumed when a payload carries a price but no currency code.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Which template actually produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Welcome,
    CourseEnrollment,
    AdminNotification,
}

impl TemplateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::CourseEnrollment => "course-enrollment",
            Self::AdminNotification => "admin-notification",
        }
    }

    /// Student-facing mails carry the academy's reply-to; operator
    /// notifications do not.
    pub fn uses_reply_to(self) -> bool {
        !matches!(self, Self::AdminNotification)
    }
}

/// A fully rendered message, ready to hand to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub kind: TemplateKind,
    pub subject: String,
    pub html: String,
}

/// Signature shared by every template.
pub type RenderFn = fn(&Map<String, Value>) -> Result<RenderedEmail, SendError>;

const REGISTRY: &[(&str, RenderFn)] = &[
    ("welcome", welcome::render),
    ("course-enrollment", enrollment::render),
    ("admin-notification", admin::render),
    ("admin_notification", admin::render),
];

/// Look up the render function for a type identifier.
pub fn lookup(email_type: &str) -> Option<RenderFn> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == email_type)
        .map(|(_, render)| *render)
}

/// Resolve and render in one step. Unknown identifiers are the only
/// rejection path.
pub fn render(email_type: &str, data: &Map<String, Value>) -> Result<RenderedEmail, SendError> {
    let render = lookup(email_type)
        .ok_or_else(|| ValidationError::UnsupportedType(email_type.to_string()))?;
    render(data)
}

/// Course details carried by several payloads.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    #[serde(alias = "courseTitle", deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "courseInfo.title must not be empty"))]
    pub title: String,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CourseInfo {
    pub fn formatted_price(&self) -> String {
        format_price(self.price, self.currency.as_deref())
    }
}

/// Render an amount the way the French copy expects, e.g. `49,00 €` or
/// `120,50 CHF`.
pub fn format_price(amount: Decimal, currency: Option<&str>) -> String {
    let code = currency
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_ascii_uppercase();
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let amount = format!("{amount:.2}").replace('.', ",");

    let symbol = match code.as_str() {
        "EUR" => "€",
        "USD" => "$",
        "GBP" => "£",
        other => other,
    };
    format!("{amount} {symbol}")
}

/// Decode `data` into the template's payload and run its field rules.
fn decode_payload<T: DeserializeOwned + Validate>(
    email_type: &str,
    data: &Map<String, Value>,
) -> Result<T, ValidationError> {
    let payload: T = serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| invalid(email_type, e.to_string()))?;
    payload
        .validate()
        .map_err(|errors| invalid(email_type, describe_violations(&errors)))?;
    Ok(payload)
}

fn invalid(email_type: &str, reason: String) -> ValidationError {
    ValidationError::InvalidData {
        email_type: email_type.to_string(),
        reason,
    }
}

/// Flatten validator output into one line, nested structs included.
/// Sorted so the message is stable across runs.
fn describe_violations(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_violations(errors, &mut messages);
    messages.sort();
    if messages.is_empty() {
        "validation failed".to_string()
    } else {
        messages.join("; ")
    }
}

fn collect_violations(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("invalid {field}")),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_violations(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_violations(inner, out);
                }
            }
        }
    }
}

fn non_negative(price: &Decimal) -> Result<(), validator::ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut error = validator::ValidationError::new("non_negative");
        error.message = Some(Cow::from("price must not be negative"));
        return Err(error);
    }
    Ok(())
}

/// Required text fields are trimmed on the way in so `length(min = 1)`
/// also rejects whitespace-only values.
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}
