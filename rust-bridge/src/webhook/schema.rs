//! Webhook payload schema validation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ErrorKind};
use crate::pipeline::{RequestContext, Stage};

/// A validated webhook payload.
///
/// Both fields are required; [`WebhookSchemaStage`] rejects anything else
/// before business logic runs.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub secret: String,
    /// Opaque payment object; republished as-is
    pub payment: Value,
}

/// Validates the parsed body against the webhook schema, reporting every
/// missing property by name rather than stopping at the first.
pub struct WebhookSchemaStage;

#[async_trait]
impl Stage for WebhookSchemaStage {
    fn name(&self) -> &'static str {
        "webhook_schema_stage"
    }

    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let body = ctx.parsed.as_ref().ok_or_else(|| {
            ApiError::new(
                ErrorKind::SchemaValidationFailed,
                "Event object failed validation",
            )
        })?;

        let mut detail = Vec::new();

        match body.as_object() {
            Some(object) => {
                if !matches!(object.get("secret"), Some(Value::String(_))) {
                    detail.push("missing required property 'secret'".to_string());
                }
                if !matches!(object.get("payment"), Some(Value::Object(_))) {
                    detail.push("missing required property 'payment'".to_string());
                }
            }
            None => detail.push("body must be an object".to_string()),
        }

        if detail.is_empty() {
            Ok(())
        } else {
            Err(ApiError::with_detail(
                ErrorKind::SchemaValidationFailed,
                "Event object failed validation",
                detail,
            ))
        }
    }
}
