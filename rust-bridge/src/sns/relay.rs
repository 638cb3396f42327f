//! Notification relay - forwarding verified payloads downstream.

use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ApiError, ErrorKind};
use crate::sns::envelope::SnsEnvelope;
use crate::util::redact::body_for_log;

/// POST the notification's opaque `Message` payload to the configured
/// target endpoint.
///
/// A missing target is 503 rather than 4xx on purpose: the operator can
/// set `TARGET_ENDPOINT` before SNS redelivers, so the message is not
/// permanently rejected. Upstream failures are 502; the upstream response
/// is logged for diagnosis but never surfaced to SNS. Note the asymmetry
/// with the confirmation handler's 500s: confirmation failures are our
/// side of the handshake, relay failures are a third party's.
///
/// Replayed notifications are relayed again; there is no dedup.
pub async fn relay_notification(
    client: &Client,
    config: &Config,
    envelope: &SnsEnvelope,
) -> Result<(), ApiError> {
    let endpoint = match config.target_endpoint() {
        Some(e) => e,
        None => {
            error!(
                message_id = %envelope.message_id,
                "relay_target_not_configured"
            );
            return Err(ApiError::new(
                ErrorKind::TargetNotConfigured,
                "Target endpoint not configured",
            ));
        }
    };

    info!(
        message_id = %envelope.message_id,
        target_endpoint = endpoint,
        message = body_for_log(config.log_sns_message_body, &envelope.message),
        "relay_post_starting"
    );

    let response = match client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .body(envelope.message.clone())
        .timeout(config.request_timeout())
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            warn!(
                message_id = %envelope.message_id,
                target_endpoint = endpoint,
                error = %e,
                is_timeout = e.is_timeout(),
                "relay_connection_error"
            );
            return Err(ApiError::new(
                ErrorKind::UpstreamConnectionError,
                "Error connecting to upstream",
            ));
        }
    };

    if response.status().is_success() {
        info!(
            topic_arn = %envelope.topic_arn,
            message_id = %envelope.message_id,
            message_timestamp = %envelope.timestamp,
            target_endpoint = endpoint,
            response_status = response.status().as_u16(),
            "relay_delivered"
        );
        Ok(())
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(
            message_id = %envelope.message_id,
            target_endpoint = endpoint,
            response_status = status,
            response_body = body_for_log(config.log_fetch_body, &body),
            "relay_error_response"
        );
        Err(ApiError::new(
            ErrorKind::UpstreamErrorResponse,
            "Error response from upstream",
        ))
    }
}
