//! Error taxonomy and wire-format mapping.
//!
//! Every failure in the system is an [`ApiError`]. The HTTP status derived
//! from its kind is the contract with SNS: 4xx means "do not redeliver",
//! 5xx means "redeliver later". Handlers never build response bodies for
//! failures themselves; the single [`IntoResponse`] impl here renders the
//! JSON error-object list.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Classification of every failure mode.
///
/// The split between 4xx and 5xx kinds is deliberate and drives SNS
/// redelivery; see [`ApiError::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Message-type header missing, or topic header missing/mismatched
    InvalidHeaders,
    /// Message-type header present but not a recognized SNS type
    UnknownMessageType,
    /// SNS body failed structural or cryptographic verification
    SnsVerificationFailed,
    /// SubscriptionConfirmation without a SubscribeURL
    NoSubscribeUrl,
    /// Missing or non-JSON content-type header
    ContentTypeRequired,
    /// Body declared as JSON but unparseable
    InvalidJsonBody,
    /// Webhook payload missing required properties
    SchemaValidationFailed,
    /// Webhook secret mismatch
    Forbidden,
    /// Transport failure calling the SubscribeURL
    ConfirmationTransportError,
    /// Non-success response from the SubscribeURL
    ConfirmationFailed,
    /// Topic publish failed
    PublishFailed,
    /// Transport failure posting to the relay target
    UpstreamConnectionError,
    /// Non-success response from the relay target
    UpstreamErrorResponse,
    /// TARGET_ENDPOINT not configured; operator-fixable, so retryable
    TargetNotConfigured,
    /// Unexpected internal fault caught at the boundary
    Internal,
}

/// A terminal pipeline or handler failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(
        kind: ErrorKind,
        message: impl Into<String>,
        detail: Vec<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// The HTTP status for this error, matched exhaustively so a new kind
    /// cannot ship without a retry decision.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidHeaders
            | ErrorKind::UnknownMessageType
            | ErrorKind::SnsVerificationFailed
            | ErrorKind::NoSubscribeUrl
            | ErrorKind::ContentTypeRequired
            | ErrorKind::SchemaValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidJsonBody => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ConfirmationTransportError
            | ErrorKind::ConfirmationFailed
            | ErrorKind::PublishFailed
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UpstreamConnectionError | ErrorKind::UpstreamErrorResponse => {
                StatusCode::BAD_GATEWAY
            }
            ErrorKind::TargetNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Unexpected faults are never surfaced verbatim; they become a generic 500.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "internal_error");
        ApiError::new(ErrorKind::Internal, "Internal server error")
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// One entry of the JSON error-object list.
/// Shape per https://jsonapi.org/examples/#error-objects-basics
#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Vec<String>>,
}

/// Error response body: `{"errors":[{status, message, detail?}]}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorObject>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            errors: vec![ErrorObject {
                status: status.as_u16(),
                message: self.message,
                detail: self.detail,
            }],
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ErrorKind::InvalidHeaders, 400),
            (ErrorKind::UnknownMessageType, 400),
            (ErrorKind::SnsVerificationFailed, 400),
            (ErrorKind::NoSubscribeUrl, 400),
            (ErrorKind::ContentTypeRequired, 400),
            (ErrorKind::SchemaValidationFailed, 400),
            (ErrorKind::Forbidden, 403),
            (ErrorKind::InvalidJsonBody, 422),
            (ErrorKind::ConfirmationTransportError, 500),
            (ErrorKind::ConfirmationFailed, 500),
            (ErrorKind::PublishFailed, 500),
            (ErrorKind::Internal, 500),
            (ErrorKind::UpstreamConnectionError, 502),
            (ErrorKind::UpstreamErrorResponse, 502),
            (ErrorKind::TargetNotConfigured, 503),
        ];
        for (kind, expected) in cases {
            assert_eq!(
                ApiError::new(kind, "x").status().as_u16(),
                expected,
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_verification_failures_are_never_retryable() {
        let err = ApiError::new(ErrorKind::SnsVerificationFailed, "x");
        assert!(err.status().is_client_error());
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::new(ErrorKind::InvalidHeaders, "Invalid Headers");
        let status = err.status();
        let body = ErrorBody {
            errors: vec![ErrorObject {
                status: status.as_u16(),
                message: err.message,
                detail: err.detail,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errors": [{"status": 400, "message": "Invalid Headers"}]
            })
        );
    }

    #[test]
    fn test_error_body_detail_included_when_present() {
        let err = ApiError::with_detail(
            ErrorKind::SchemaValidationFailed,
            "Event object failed validation",
            vec!["missing required property 'secret'".to_string()],
        );
        let json = serde_json::to_value(&ErrorBody {
            errors: vec![ErrorObject {
                status: err.status().as_u16(),
                message: err.message,
                detail: err.detail,
            }],
        })
        .unwrap();
        assert_eq!(
            json["errors"][0]["detail"][0],
            "missing required property 'secret'"
        );
    }

    #[test]
    fn test_from_anyhow_is_generic_500() {
        let err: ApiError = anyhow::anyhow!("database exploded").into();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Internal text must not leak
        assert_eq!(err.message, "Internal server error");
    }
}
