//! Header classification and content-type fixing for the SNS entry point.

use async_trait::async_trait;
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue};
use tracing::warn;

use crate::error::{ApiError, ErrorKind};
use crate::pipeline::{RequestContext, Stage};
use crate::sns::envelope::{MessageType, SNS_AGENT};

/// Header carrying the SNS message type.
pub const MESSAGE_TYPE_HEADER: &str = "x-amz-sns-message-type";

/// Header carrying the originating topic ARN.
pub const TOPIC_ARN_HEADER: &str = "x-amz-sns-topic-arn";

/// Classify a request from its message-type header.
pub fn classify(headers: &HeaderMap) -> MessageType {
    headers
        .get(MESSAGE_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(MessageType::parse)
        .unwrap_or(MessageType::Unknown)
}

/// First stage of the SNS pipeline.
///
/// Rejects requests without the SNS headers or with a topic ARN that is not
/// exactly the configured one, rejects unrecognized message types, and
/// synthesizes `Content-Type: application/json` when SNS omitted it (SNS
/// does not always set content-type, and later body parsing needs it).
pub struct SnsHeaderStage {
    topic_arn: String,
}

impl SnsHeaderStage {
    pub fn new(topic_arn: impl Into<String>) -> Self {
        Self {
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl Stage for SnsHeaderStage {
    fn name(&self) -> &'static str {
        "sns_header_stage"
    }

    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let message_type = match ctx.header_str(MESSAGE_TYPE_HEADER) {
            Some(v) => v.to_string(),
            None => {
                warn!("sns_message_type_header_missing");
                return Err(ApiError::new(ErrorKind::InvalidHeaders, "Invalid Headers"));
            }
        };

        // Exact string match on the topic ARN; no normalization, no wildcard
        match ctx.header_str(TOPIC_ARN_HEADER) {
            Some(arn) if arn == self.topic_arn => {}
            other => {
                warn!(
                    topic_arn_present = other.is_some(),
                    "sns_topic_arn_mismatch"
                );
                return Err(ApiError::new(ErrorKind::InvalidHeaders, "Invalid Headers"));
            }
        }

        if MessageType::parse(&message_type) == MessageType::Unknown {
            warn!(message_type = %message_type, "sns_unknown_message_type");
            return Err(ApiError::new(
                ErrorKind::UnknownMessageType,
                "Unknown message type",
            ));
        }

        fix_content_type(&mut ctx.headers);

        Ok(())
    }
}

/// Synthesize `Content-Type: application/json` for genuine SNS traffic.
///
/// Applies only when the message-type header is present, the User-Agent is
/// exactly the SNS agent string, and no content-type is already set. Never
/// overrides an existing content-type.
fn fix_content_type(headers: &mut HeaderMap) {
    let is_sns_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua == SNS_AGENT)
        .unwrap_or(false);

    if headers.contains_key(MESSAGE_TYPE_HEADER)
        && is_sns_agent
        && !headers.contains_key(CONTENT_TYPE)
    {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
}
