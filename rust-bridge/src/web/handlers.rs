//! Route handlers and router assembly.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ApiError, ErrorKind};
use crate::pipeline::{run_stages, ContentTypeValidator, JsonBodyParser, RequestContext, Stage};
use crate::publish::TopicPublisher;
use crate::sns::{
    classify, confirm_subscription, relay_notification, MessageType, SnsEnvelope, SnsHeaderStage,
    SnsVerifyStage,
};
use crate::util::redact::body_for_log;
use crate::webhook::{check_secret, WebhookPayload, WebhookSchemaStage};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
    pub publisher: Arc<dyn TopicPublisher>,
    /// Signature verification stage for the SNS pipeline; a seam like
    /// `publisher`, so tests can substitute a stand-in
    pub verifier: Arc<dyn Stage>,
}

impl AppState {
    pub fn new(config: Config, http: Client, publisher: Arc<dyn TopicPublisher>) -> Self {
        let verifier = Arc::new(SnsVerifyStage::new(http.clone(), config.request_timeout()));
        Self {
            config: Arc::new(config),
            http,
            publisher,
            verifier,
        }
    }

    /// Replace the signature verification stage.
    pub fn with_verifier(mut self, verifier: Arc<dyn Stage>) -> Self {
        self.verifier = verifier;
        self
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sns", post(sns_message))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Panics must not escape as hung connections or leak internals; they get
/// the same generic 500 body as any other internal fault.
fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    error!("handler_panicked");
    ApiError::new(ErrorKind::Internal, "Internal server error").into_response()
}

/// Success body for handler responses.
#[derive(Serialize)]
pub struct Ack {
    pub message: &'static str,
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// SNS entry point
// =============================================================================

/// Notification entry point.
///
/// Runs the SNS pipeline (headers, signature, body parse) and dispatches
/// on the classified message type.
pub async fn sns_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!(
        body_length = body.len(),
        body = body_for_log(state.config.log_event_body, &String::from_utf8_lossy(&body)),
        "sns_request_received"
    );

    let mut ctx = RequestContext::new(headers, body);
    let header_stage = SnsHeaderStage::new(state.config.topic_arn.clone());
    let stages: [&dyn Stage; 3] = [&header_stage, state.verifier.as_ref(), &JsonBodyParser];
    run_stages(&stages, &mut ctx).await?;

    let message_type = classify(&ctx.headers);
    let parsed = ctx
        .parsed
        .take()
        .ok_or_else(|| ApiError::new(ErrorKind::Internal, "Internal server error"))?;
    let envelope: SnsEnvelope = serde_json::from_value(parsed).map_err(|e| {
        error!(error = %e, "sns_envelope_parse_failed");
        ApiError::new(ErrorKind::Internal, "Internal server error")
    })?;

    match message_type {
        MessageType::Notification => {
            relay_notification(&state.http, &state.config, &envelope).await?;
            Ok((StatusCode::OK, Json(Ack { message: "Delivered" })).into_response())
        }
        MessageType::SubscriptionConfirmation => {
            confirm_subscription(&state.http, &state.config, &envelope).await?;
            Ok((
                StatusCode::OK,
                Json(Ack {
                    message: "Subscription confirmed.",
                }),
            )
                .into_response())
        }
        // The header stage already rejected these
        MessageType::Unknown => Err(ApiError::new(
            ErrorKind::UnknownMessageType,
            "Unknown message type",
        )),
    }
}

// =============================================================================
// Webhook entry point
// =============================================================================

/// Webhook ingress endpoint.
///
/// Validates content-type, body, and schema, checks the shared secret,
/// then republishes the entire payload onto the configured topic.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!(
        body_length = body.len(),
        body = body_for_log(state.config.log_event_body, &String::from_utf8_lossy(&body)),
        "webhook_request_received"
    );

    let mut ctx = RequestContext::new(headers, body);
    let content_type = ContentTypeValidator::json();
    let stages: [&dyn Stage; 3] = [&content_type, &JsonBodyParser, &WebhookSchemaStage];
    run_stages(&stages, &mut ctx).await?;

    let parsed = ctx
        .parsed
        .take()
        .ok_or_else(|| ApiError::new(ErrorKind::Internal, "Internal server error"))?;
    let payload: WebhookPayload = serde_json::from_value(parsed.clone()).map_err(|e| {
        error!(error = %e, "webhook_payload_parse_failed");
        ApiError::new(ErrorKind::Internal, "Internal server error")
    })?;

    check_secret(&state.config, &payload)?;

    let message = serde_json::to_string(&parsed)
        .map_err(|e| ApiError::from(anyhow::Error::from(e)))?;

    if let Err(e) = state
        .publisher
        .publish(&state.config.topic_arn, &message)
        .await
    {
        warn!(error = %e, "webhook_publish_failed");
        return Err(ApiError::new(ErrorKind::PublishFailed, "Message not queued."));
    }

    info!(topic_arn = %state.config.topic_arn, "webhook_accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(Ack {
            message: "Update event accepted.",
        }),
    )
        .into_response())
}
