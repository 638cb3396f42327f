//! Subscription confirmation handshake.
//!
//! SNS delivers nothing to an endpoint until the endpoint fetches the
//! one-time SubscribeURL from a SubscriptionConfirmation message.

use reqwest::Client;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{ApiError, ErrorKind};
use crate::sns::envelope::SnsEnvelope;

/// Complete the handshake by issuing a single GET to the SubscribeURL.
///
/// A missing URL is a permanent 400; transport errors and error responses
/// are 500 so SNS redelivers the confirmation and we get another chance.
pub async fn confirm_subscription(
    client: &Client,
    config: &Config,
    envelope: &SnsEnvelope,
) -> Result<(), ApiError> {
    let subscribe_url = match envelope.subscribe_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => {
            error!(
                message_id = %envelope.message_id,
                topic_arn = %envelope.topic_arn,
                "sns_confirmation_missing_subscribe_url"
            );
            return Err(ApiError::new(ErrorKind::NoSubscribeUrl, "No Subscribe URL"));
        }
    };

    let response = match client
        .get(subscribe_url)
        .timeout(config.request_timeout())
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            error!(
                message_id = %envelope.message_id,
                topic_arn = %envelope.topic_arn,
                error = %e,
                is_timeout = e.is_timeout(),
                "sns_confirmation_fetch_error"
            );
            return Err(ApiError::new(
                ErrorKind::ConfirmationTransportError,
                "Error when attempting to confirm subscription",
            ));
        }
    };

    if response.status().is_success() {
        info!(
            topic_arn = %envelope.topic_arn,
            "sns_subscription_confirmed"
        );
        Ok(())
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(
            message_id = %envelope.message_id,
            topic_arn = %envelope.topic_arn,
            response_status = status,
            response_body = crate::util::redact::body_for_log(config.log_fetch_body, &body),
            "sns_confirmation_error_response"
        );
        Err(ApiError::new(
            ErrorKind::ConfirmationFailed,
            "Failed to confirm subscription",
        ))
    }
}
