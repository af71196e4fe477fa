use askama::Template;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use super::{
    CourseInfo, RenderedEmail, TemplateKind, current_year, decode_payload, describe_violations,
    invalid,
};
use crate::error::{SendError, ValidationError};

const EMAIL_TYPE: &str = "admin-notification";

/// Payload for `admin-notification` / `admin_notification`: tells the
/// operator about a signup.
///
/// The course may arrive nested as `courseInfo` or as flat
/// `courseTitle`/`price`/`currency` fields; `courseInfo` wins when both are
/// sent.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminNotificationData {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    pub first_name: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "lastName must not be empty"))]
    pub last_name: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub course_info: Option<CourseInfo>,
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl AdminNotificationData {
    /// The course this signup is for, if any.
    fn course(&self) -> Result<Option<CourseInfo>, ValidationError> {
        if let Some(info) = &self.course_info {
            return Ok(Some(info.clone()));
        }

        let title = optional_text(self.course_title.as_deref());
        match (title, self.price) {
            (None, None) => Ok(None),
            (Some(title), Some(price)) => {
                let info = CourseInfo {
                    title: title.to_string(),
                    price,
                    currency: self.currency.clone(),
                };
                info.validate()
                    .map_err(|errors| invalid(EMAIL_TYPE, describe_violations(&errors)))?;
                Ok(Some(info))
            }
            (Some(_), None) => Err(invalid(
                EMAIL_TYPE,
                "price is required when courseTitle is given".into(),
            )),
            (None, Some(_)) => Err(invalid(
                EMAIL_TYPE,
                "courseTitle is required when price is given".into(),
            )),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_notification.html")]
struct AdminHtml<'a> {
    received_at: String,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    message: Option<&'a str>,
    course_title: Option<&'a str>,
    price: Option<String>,
    year: i32,
}

pub(super) fn render(data: &Map<String, Value>) -> Result<RenderedEmail, SendError> {
    let payload: AdminNotificationData = decode_payload(EMAIL_TYPE, data)?;
    let course = payload.course()?;

    let html = AdminHtml {
        received_at: chrono::Utc::now().format("%d/%m/%Y %H:%M UTC").to_string(),
        first_name: &payload.first_name,
        last_name: &payload.last_name,
        email: &payload.email,
        phone: optional_text(payload.phone.as_deref()),
        message: optional_text(payload.message.as_deref()),
        course_title: course.as_ref().map(|c| c.title.as_str()),
        price: course.as_ref().map(CourseInfo::formatted_price),
        year: current_year(),
    }
    .render()
    .map_err(SendError::unexpected)?;

    Ok(RenderedEmail {
        kind: TemplateKind::AdminNotification,
        subject: format!(
            "🔔 Nouvelle inscription : {} {}",
            payload.first_name, payload.last_name
        ),
        html,
    })
}

fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
