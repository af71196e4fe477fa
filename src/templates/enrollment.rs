use askama::Template;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use super::{RenderedEmail, TemplateKind, current_year, decode_payload, format_price, non_negative};
use crate::error::SendError;

const EMAIL_TYPE: &str = "course-enrollment";

/// Payload for `course-enrollment`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CourseEnrollmentData {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    pub first_name: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "lastName must not be empty"))]
    pub last_name: String,
    #[serde(alias = "title", deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "courseTitle must not be empty"))]
    pub course_title: String,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    /// Free-form, shown as given (e.g. "3 mars 2026").
    #[serde(default)]
    pub start_date: Option<String>,
}

#[derive(Template)]
#[template(path = "course_enrollment.html")]
struct EnrollmentHtml<'a> {
    first_name: &'a str,
    last_name: &'a str,
    course_title: &'a str,
    price: &'a str,
    start_date: Option<&'a str>,
    year: i32,
}

pub(super) fn render(data: &Map<String, Value>) -> Result<RenderedEmail, SendError> {
    let payload: CourseEnrollmentData = decode_payload(EMAIL_TYPE, data)?;

    let start_date = payload
        .start_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    compose(
        &payload.first_name,
        &payload.last_name,
        &payload.course_title,
        &format_price(payload.price, payload.currency.as_deref()),
        start_date,
    )
}

/// Shared by `welcome` when the payload carries course information.
pub(super) fn compose(
    first_name: &str,
    last_name: &str,
    course_title: &str,
    price: &str,
    start_date: Option<&str>,
) -> Result<RenderedEmail, SendError> {
    let html = EnrollmentHtml {
        first_name,
        last_name,
        course_title,
        price,
        start_date,
        year: current_year(),
    }
    .render()
    .map_err(SendError::unexpected)?;

    Ok(RenderedEmail {
        kind: TemplateKind::CourseEnrollment,
        subject: format!("Inscription à la formation : {course_title}"),
        html,
    })
}
