use std::sync::Arc;

use anyhow::Context;
use mailhook::config::AppConfig;
use mailhook::provider::{EmailTransport, ResendTransport};
use mailhook::routes::{AppState, app_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    let resend = ResendTransport::new(config.resend.clone());
    if !resend.has_api_key() {
        tracing::warn!("RESEND_API_KEY not set; every send will fail with a configuration error");
    }
    let transport: Arc<dyn EmailTransport> = Arc::new(resend);

    tracing::info!(
        from = %config.sender.from_address,
        reply_to = ?config.sender.reply_to,
        provider = %config.resend.base_url,
        "Mailhook v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = app_routes(AppState::new(transport, config.sender));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Listening on /api/send-email");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
