//! SNSBridge web server.
//!
//! Receives SNS Notification/SubscriptionConfirmation requests on `/sns`
//! and third-party webhook payloads on `/webhook`. The status codes it
//! returns drive SNS redelivery: 4xx rejects permanently, 5xx asks for a
//! retry.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use snsbridge::web::router;
use snsbridge::{AppState, Config, SnsTopicPublisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("bridge_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        topic_arn = %config.topic_arn,
        target_endpoint_configured = config.target_endpoint().is_some(),
        webhook_secret_configured = config.webhook_secret().is_some(),
        request_timeout_ms = config.request_timeout_ms,
        sns_endpoint = ?config.sns_endpoint,
        "config_loaded"
    );

    // Shared outbound HTTP client
    let http = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    // SNS publisher for the webhook path
    let publisher = Arc::new(SnsTopicPublisher::from_config(&config).await);
    info!("sns_publisher_created");

    let port = config.port;
    let state = AppState::new(config, http, publisher);
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "bridge_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("bridge_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("bridge_shutting_down");
}
