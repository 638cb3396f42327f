//! Topic publishing for the webhook path.
//!
//! The publisher is behind a trait so handlers stay testable without an
//! SNS endpoint; the production implementation wraps the AWS SDK client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::config::Config;

/// Publishes a single message onto a topic.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<()>;
}

/// SNS-backed publisher.
pub struct SnsTopicPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsTopicPublisher {
    /// Build the SNS client, honoring the configured endpoint override for
    /// local/offline runs.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = &config.sns_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;
        Self {
            client: aws_sdk_sns::Client::new(&shared),
        }
    }
}

#[async_trait]
impl TopicPublisher for SnsTopicPublisher {
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<()> {
        self.client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .send()
            .await
            .context("Failed to publish to SNS topic")?;

        info!(topic_arn = topic_arn, "sns_message_published");
        Ok(())
    }
}
