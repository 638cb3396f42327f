//! SNS message envelope types.

use serde::Deserialize;

/// Exact User-Agent string SNS sends; the header fixer keys off it.
pub const SNS_AGENT: &str = "Amazon Simple Notification Service Agent";

/// Kind of inbound SNS request, classified from the message-type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Notification,
    SubscriptionConfirmation,
    /// Anything else, including valid-looking but unrecognized values
    Unknown,
}

impl MessageType {
    pub fn parse(value: &str) -> Self {
        match value {
            "Notification" => MessageType::Notification,
            "SubscriptionConfirmation" => MessageType::SubscriptionConfirmation,
            _ => MessageType::Unknown,
        }
    }
}

/// A parsed SNS message body.
///
/// Only ever constructed from a body that already passed signature
/// verification; the verifier works on the raw bytes instead.
#[derive(Debug, Clone, Deserialize)]
pub struct SnsEnvelope {
    #[serde(rename = "Type", default)]
    pub kind: String,

    #[serde(rename = "TopicArn", default)]
    pub topic_arn: String,

    #[serde(rename = "MessageId", default)]
    pub message_id: String,

    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,

    #[serde(rename = "Subject", default)]
    pub subject: Option<String>,

    /// Opaque payload; forwarded verbatim on the Notification path
    #[serde(rename = "Message", default)]
    pub message: String,

    /// Present only for SubscriptionConfirmation
    #[serde(rename = "SubscribeURL", default)]
    pub subscribe_url: Option<String>,

    /// Present only for SubscriptionConfirmation
    #[serde(rename = "Token", default)]
    pub token: Option<String>,
}
