use askama::Template;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use super::{CourseInfo, RenderedEmail, TemplateKind, current_year, decode_payload, enrollment};
use crate::error::SendError;

const EMAIL_TYPE: &str = "welcome";

/// Payload for `welcome`. When `courseInfo` is present the message is the
/// course-enrollment variant instead of the generic greeting.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeData {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "firstName must not be empty"))]
    pub first_name: String,
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "lastName must not be empty"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(nested)]
    pub course_info: Option<CourseInfo>,
}

#[derive(Template)]
#[template(path = "welcome.html")]
struct WelcomeHtml<'a> {
    first_name: &'a str,
    last_name: &'a str,
    year: i32,
}

pub(super) fn render(data: &Map<String, Value>) -> Result<RenderedEmail, SendError> {
    let payload: WelcomeData = decode_payload(EMAIL_TYPE, data)?;

    if let Some(course) = &payload.course_info {
        return enrollment::compose(
            &payload.first_name,
            &payload.last_name,
            &course.title,
            &course.formatted_price(),
            None,
        );
    }

    let html = WelcomeHtml {
        first_name: &payload.first_name,
        last_name: &payload.last_name,
        year: current_year(),
    }
    .render()
    .map_err(SendError::unexpected)?;

    Ok(RenderedEmail {
        kind: TemplateKind::Welcome,
        subject: "Bienvenue sur StatSecure Academy ! 🎉".to_string(),
        html,
    })
}
