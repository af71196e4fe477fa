//! Integration tests for the send-email endpoint against a fake Resend API.
//!
//! Each test spins up two Axum servers on random ports: a stand-in for the
//! Resend API and the mailhook app wired to it through `ResendTransport`.
//! Requests go over real sockets with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use mailhook::config::{ResendConfig, SenderConfig};
use mailhook::provider::ResendTransport;
use mailhook::routes::{AppState, app_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the fake provider saw: (authorization header, JSON body).
type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Serve `app` on a random local port and return the port.
async fn serve(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}

/// Start a fake Resend API that answers every `POST /emails` with the given
/// status and body.
async fn start_provider(status: StatusCode, reply: Value) -> (u16, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);

    let app = Router::new().route(
        "/emails",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = Arc::clone(&recorder);
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                recorder.lock().unwrap().push((auth, body));
                (status, Json(reply))
            }
        }),
    );

    (serve(app).await, seen)
}

/// Start mailhook pointed at the fake provider.
async fn start_app(provider_port: u16, api_key: Option<&str>) -> u16 {
    let transport = ResendTransport::new(ResendConfig {
        api_key: api_key.map(SecretString::from),
        base_url: format!("http://127.0.0.1:{provider_port}"),
    });
    let sender = SenderConfig {
        from_address: "Academy <hello@example.com>".into(),
        reply_to: Some("support@example.com".into()),
    };
    serve(app_routes(AppState::new(Arc::new(transport), sender))).await
}

fn endpoint(port: u16) -> String {
    format!("http://127.0.0.1:{port}/api/send-email")
}

fn welcome_request() -> Value {
    json!({
        "type": "welcome",
        "to": "grace@example.com",
        "data": {"firstName": "Grace", "lastName": "Hopper"}
    })
}

// ── Happy path ───────────────────────────────────────────────────────

#[tokio::test]
async fn send_forwards_to_resend_and_returns_id() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "abc123"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&welcome_request())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["access-control-allow-origin"].to_str().unwrap(),
            "*"
        );
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["emailId"], "abc123");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, sent) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer re_test_key"));
        assert_eq!(sent["from"], "Academy <hello@example.com>");
        assert_eq!(sent["to"], json!(["grace@example.com"]));
        assert_eq!(sent["reply_to"], "support@example.com");
        assert_eq!(sent["subject"], "Bienvenue sur StatSecure Academy ! 🎉");
        let html = sent["html"].as_str().unwrap();
        assert_eq!(html.matches("Grace").count(), 1);
        assert_eq!(html.matches("Hopper").count(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn course_enrollment_is_sent() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "enr-1"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&json!({
                "type": "course-enrollment",
                "to": "alan@example.com",
                "data": {
                    "firstName": "Alan",
                    "lastName": "Turing",
                    "courseTitle": "Computability",
                    "price": 49
                }
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let sent = seen.lock().unwrap()[0].1.clone();
        assert_eq!(sent["subject"], "Inscription à la formation : Computability");
        assert!(sent["html"].as_str().unwrap().contains("49,00 €"));
    })
    .await
    .expect("test timed out");
}

// ── Failures ─────────────────────────────────────────────────────────

#[tokio::test]
async fn provider_rejection_surfaces_details() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"statusCode": 422, "name": "validation_error", "message": "Invalid `from` field."}),
        )
        .await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&welcome_request())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["details"]["name"], "validation_error");
        assert_eq!(body["details"]["message"], "Invalid `from` field.");
        assert_eq!(seen.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_api_key_is_500_without_provider_call() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "never"})).await;
        let port = start_app(provider, None).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&welcome_request())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(
            body["error"].as_str().unwrap().contains("RESEND_API_KEY"),
            "{body}"
        );
        assert!(seen.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn validation_failure_never_reaches_provider() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "never"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&json!({"type": "welcome", "data": {"firstName": "Grace"}}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Missing required fields: to");
        assert!(seen.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn success_without_id_is_500_without_details() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&welcome_request())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(
            body["error"].as_str().unwrap().contains("Invalid response from Resend"),
            "{body}"
        );
        assert!(body.get("details").is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_provider_is_500_without_details() {
    timeout(TEST_TIMEOUT, async {
        // Reserve a port, then free it so nothing is listening there.
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = closed.local_addr().unwrap().port();
        drop(closed);
        let port = start_app(closed_port, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&welcome_request())
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(
            body["error"].as_str().unwrap().contains("Resend request failed"),
            "{body}"
        );
        assert!(body.get("details").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn admin_notification_has_no_reply_to() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "adm-1"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .post(endpoint(port))
            .json(&json!({
                "type": "admin-notification",
                "to": "ops@example.com",
                "data": {
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "ada@example.com",
                    "courseTitle": "Analytical Engines",
                    "price": 250,
                    "currency": "EUR"
                }
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let sent = seen.lock().unwrap()[0].1.clone();
        assert_eq!(sent["subject"], "🔔 Nouvelle inscription : Ada Lovelace");
        assert!(sent.get("reply_to").is_none());
        let html = sent["html"].as_str().unwrap();
        assert!(html.contains("Analytical Engines"));
        assert!(html.contains("250,00 €"));
    })
    .await
    .expect("test timed out");
}

// ── Preflight / methods ──────────────────────────────────────────────

#[tokio::test]
async fn preflight_gets_cors_headers() {
    timeout(TEST_TIMEOUT, async {
        let (provider, seen) = start_provider(StatusCode::OK, json!({"id": "never"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, endpoint(port))
            .header("origin", "https://academy.example.com")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let headers = resp.headers().clone();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
        assert!(resp.bytes().await.unwrap().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn get_is_method_not_allowed() {
    timeout(TEST_TIMEOUT, async {
        let (provider, _seen) = start_provider(StatusCode::OK, json!({"id": "never"})).await;
        let port = start_app(provider, Some("re_test_key")).await;

        let resp = reqwest::get(endpoint(port)).await.unwrap();

        assert_eq!(resp.status(), 405);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"success": false, "error": "Method not allowed"}));
    })
    .await
    .expect("test timed out");
}
