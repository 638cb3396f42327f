//! Webhook ingress: third-party payloads republished onto the topic.
//!
//! ## Processing flow
//!
//! ```text
//! POST /webhook → ContentTypeValidator → JsonBodyParser → WebhookSchemaStage
//!                  → secret check → publish full body to TOPIC_ARN
//! ```

pub mod schema;

pub use schema::{WebhookPayload, WebhookSchemaStage};

use tracing::warn;

use crate::config::Config;
use crate::error::{ApiError, ErrorKind};

/// Enforce the shared secret, when one is configured.
///
/// Must run before any publish attempt; a mismatch is a permanent 403.
pub fn check_secret(config: &Config, payload: &WebhookPayload) -> Result<(), ApiError> {
    let expected = match config.webhook_secret() {
        Some(secret) => secret,
        None => return Ok(()),
    };

    if constant_time_eq(expected, &payload.secret) {
        Ok(())
    } else {
        warn!("webhook_secret_mismatch");
        Err(ApiError::new(ErrorKind::Forbidden, "Wrong"))
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(secret: &str) -> WebhookPayload {
        WebhookPayload {
            secret: secret.to_string(),
            payment: json!({"id": 42}),
        }
    }

    #[test]
    fn test_no_secret_configured_allows_all() {
        let config = Config::default();
        check_secret(&config, &payload("anything")).unwrap();
    }

    #[test]
    fn test_matching_secret_passes() {
        let config = Config {
            webhook_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        check_secret(&config, &payload("s3cret")).unwrap();
    }

    #[test]
    fn test_wrong_secret_is_403() {
        let config = Config {
            webhook_secret: Some("s3cret".to_string()),
            ..Config::default()
        };
        let err = check_secret(&config, &payload("guess")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert_eq!(err.status().as_u16(), 403);
        assert_eq!(err.message, "Wrong");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}
