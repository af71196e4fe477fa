//! HTTP surface: `/api/send-email` and `/health`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SenderConfig;
use crate::error::SendError;
use crate::provider::{EmailTransport, OutboundEmail, ProviderReceipt};
use crate::request::EmailRequest;
use crate::templates;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn EmailTransport>,
    pub sender: Arc<SenderConfig>,
}

impl AppState {
    pub fn new(transport: Arc<dyn EmailTransport>, sender: SenderConfig) -> Self {
        Self {
            transport,
            sender: Arc::new(sender),
        }
    }
}

/// Build the Axum router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/send-email", any(send_email))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mailhook"
    }))
}

// ── Send ────────────────────────────────────────────────────────────────

/// `/api/send-email`, any method. CORS headers go on every response,
/// preflight and errors included.
async fn send_email(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    let mut response = handle(&state, &method, &body).await;
    apply_cors(&mut response);
    response
}

/// Method dispatch and outcome mapping, without the CORS decoration.
pub async fn handle(state: &AppState, method: &Method, body: &[u8]) -> Response {
    if *method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if *method != Method::POST {
        warn!(method = %method, "Rejected non-POST request");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(serde_json::json!({"success": false, "error": "Method not allowed"})),
        )
            .into_response();
    }

    let request_id = Uuid::new_v4();
    match deliver(state, request_id, body).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "emailId": receipt.id,
                "message": "Email sent successfully"
            })),
        )
            .into_response(),
        Err(err) => {
            match &err {
                SendError::Validation(e) => {
                    warn!(request_id = %request_id, error = %e, "Rejected send request");
                }
                SendError::Provider { status, details } => {
                    error!(
                        request_id = %request_id,
                        provider = state.transport.name(),
                        status,
                        details = %details,
                        "Email provider rejected the message"
                    );
                }
                other => {
                    error!(request_id = %request_id, error = %other, "Failed to send email");
                }
            }
            error_response(&err)
        }
    }
}

async fn deliver(
    state: &AppState,
    request_id: Uuid,
    body: &[u8],
) -> Result<ProviderReceipt, SendError> {
    let request = EmailRequest::from_body(body)?;
    let rendered = templates::render(&request.email_type, &request.data)?;
    let kind = rendered.kind;

    let email = OutboundEmail {
        from: state.sender.from_address.clone(),
        to: request.recipient,
        subject: rendered.subject,
        html: rendered.html,
        reply_to: state
            .sender
            .reply_to
            .clone()
            .filter(|_| kind.uses_reply_to()),
    };

    let receipt = state.transport.send(&email).await?;
    info!(
        request_id = %request_id,
        email_type = %request.email_type,
        template = kind.as_str(),
        email_id = %receipt.id,
        "Email sent"
    );
    Ok(receipt)
}

fn error_response(err: &SendError) -> Response {
    let mut body = serde_json::json!({
        "success": false,
        "error": err.to_string(),
    });
    if let Some(details) = err.details() {
        body["details"] = details.clone();
    }
    (err.status_code(), Json(body)).into_response()
}

fn apply_cors(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}
