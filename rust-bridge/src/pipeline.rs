//! Ordered, short-circuiting validation pipeline.
//!
//! Each entry point runs a fixed sequence of [`Stage`]s over a shared
//! [`RequestContext`]. A stage may inspect the request, mutate it (header
//! synthesis, body parsing), or terminate the pipeline with an [`ApiError`].
//! The first failing stage wins; no later stage runs. The two entry points
//! are just two stage orderings over this abstraction.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::HeaderMap;
use serde_json::Value;

use crate::error::{ApiError, ErrorKind};

/// Mutable per-request state threaded through the pipeline.
///
/// Created from the raw inbound request and destroyed when handling ends;
/// stages are the only code allowed to mutate it.
pub struct RequestContext {
    /// Inbound headers; lookups via `HeaderMap` are case-insensitive
    pub headers: HeaderMap,
    /// Raw body bytes as received
    pub body: Bytes,
    /// Structured body, populated by [`JsonBodyParser`]
    pub parsed: Option<Value>,
}

impl RequestContext {
    pub fn new(headers: HeaderMap, body: Bytes) -> Self {
        Self {
            headers,
            body,
            parsed: None,
        }
    }

    /// A header value as a string, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One step of the validation pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name for logging.
    fn name(&self) -> &'static str;

    /// Inspect and possibly mutate the request, or short-circuit with an
    /// error.
    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError>;
}

/// Run stages strictly in order, stopping at the first failure.
pub async fn run_stages(
    stages: &[&dyn Stage],
    ctx: &mut RequestContext,
) -> Result<(), ApiError> {
    for stage in stages {
        if let Err(err) = stage.apply(ctx).await {
            tracing::warn!(
                stage = stage.name(),
                kind = ?err.kind,
                status = err.status().as_u16(),
                "pipeline_stage_failed"
            );
            return Err(err);
        }
    }
    Ok(())
}

// =============================================================================
// Generic stages
// =============================================================================

/// Requires a content-type header whose media type matches exactly.
///
/// Parameters such as `charset` are ignored; `application/json; charset=utf-8`
/// passes a validator built with [`ContentTypeValidator::json`].
pub struct ContentTypeValidator {
    required: &'static str,
}

impl ContentTypeValidator {
    pub fn json() -> Self {
        Self {
            required: "application/json",
        }
    }

    fn error(&self) -> ApiError {
        ApiError::new(
            ErrorKind::ContentTypeRequired,
            format!(
                "Endpoint requires Content-Type header value {}",
                self.required
            ),
        )
    }
}

#[async_trait]
impl Stage for ContentTypeValidator {
    fn name(&self) -> &'static str {
        "content_type_validator"
    }

    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let content_type = ctx.header_str("content-type").ok_or_else(|| self.error())?;
        let media_type = content_type.split(';').next().unwrap_or("").trim();
        if !media_type.eq_ignore_ascii_case(self.required) {
            return Err(self.error());
        }
        Ok(())
    }
}

/// Parses the raw body as JSON into `ctx.parsed`.
pub struct JsonBodyParser;

#[async_trait]
impl Stage for JsonBodyParser {
    fn name(&self) -> &'static str {
        "json_body_parser"
    }

    async fn apply(&self, ctx: &mut RequestContext) -> Result<(), ApiError> {
        let parsed: Value = serde_json::from_slice(&ctx.body).map_err(|e| {
            tracing::warn!(error = %e, "json_body_parse_failed");
            ApiError::new(
                ErrorKind::InvalidJsonBody,
                "Content type defined as JSON but an invalid JSON was provided",
            )
        })?;
        ctx.parsed = Some(parsed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::{Arc, Mutex};

    fn ctx_with(content_type: Option<&str>, body: &str) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert("content-type", HeaderValue::from_str(ct).unwrap());
        }
        RequestContext::new(headers, Bytes::from(body.to_string()))
    }

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl Stage for Recorder {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn apply(&self, _ctx: &mut RequestContext) -> Result<(), ApiError> {
            self.seen.lock().unwrap().push(self.label);
            if self.fail {
                Err(ApiError::new(ErrorKind::InvalidHeaders, "Invalid Headers"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = Recorder {
            label: "first",
            seen: seen.clone(),
            fail: false,
        };
        let second = Recorder {
            label: "second",
            seen: seen.clone(),
            fail: false,
        };
        let mut ctx = ctx_with(None, "");
        run_stages(&[&first, &second], &mut ctx).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_first_failure_short_circuits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let failing = Recorder {
            label: "failing",
            seen: seen.clone(),
            fail: true,
        };
        let never_runs = Recorder {
            label: "never_runs",
            seen: seen.clone(),
            fail: false,
        };
        let mut ctx = ctx_with(None, "");
        let err = run_stages(&[&failing, &never_runs], &mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidHeaders);
        assert_eq!(*seen.lock().unwrap(), vec!["failing"]);
    }

    #[tokio::test]
    async fn test_content_type_missing() {
        let stage = ContentTypeValidator::json();
        let mut ctx = ctx_with(None, "{}");
        let err = stage.apply(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentTypeRequired);
        assert_eq!(
            err.message,
            "Endpoint requires Content-Type header value application/json"
        );
    }

    #[tokio::test]
    async fn test_content_type_wrong() {
        let stage = ContentTypeValidator::json();
        let mut ctx = ctx_with(Some("text/css"), "{}");
        let err = stage.apply(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentTypeRequired);
    }

    #[tokio::test]
    async fn test_content_type_with_charset_parameter() {
        let stage = ContentTypeValidator::json();
        let mut ctx = ctx_with(Some("application/json; charset=utf-8"), "{}");
        assert!(stage.apply(&mut ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_json_body_parser_valid() {
        let stage = JsonBodyParser;
        let mut ctx = ctx_with(None, r#"{"secret":"abc"}"#);
        stage.apply(&mut ctx).await.unwrap();
        assert_eq!(ctx.parsed.unwrap()["secret"], "abc");
    }

    #[tokio::test]
    async fn test_json_body_parser_invalid() {
        let stage = JsonBodyParser;
        let mut ctx = ctx_with(None, "not json {");
        let err = stage.apply(&mut ctx).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidJsonBody);
        assert_eq!(err.status().as_u16(), 422);
    }
}
