//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup; handlers and pipeline stages
//! only ever see the resulting immutable struct.

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Expected topic identity; inbound SNS requests must carry this exact
    /// ARN, and webhook payloads are published to it
    pub topic_arn: String,

    /// Downstream relay URL for Notification payloads.
    /// Absence is a runtime 503, not a startup error.
    pub target_endpoint: Option<String>,

    /// Optional shared secret for the webhook entry point
    pub webhook_secret: Option<String>,

    /// HTTP request timeout in milliseconds for all outbound calls
    pub request_timeout_ms: u64,

    /// Port for the web server to listen on
    pub port: u16,

    /// Optional SNS endpoint override for local/offline runs
    pub sns_endpoint: Option<String>,

    /// Log inbound request bodies (redacted by default)
    pub log_event_body: bool,

    /// Log SNS Message payloads (redacted by default)
    pub log_sns_message_body: bool,

    /// Log outbound request/response bodies (redacted by default)
    pub log_fetch_body: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            topic_arn: env::var("TOPIC_ARN").unwrap_or_default(),

            target_endpoint: env::var("TARGET_ENDPOINT").ok(),

            webhook_secret: env::var("WEBHOOK_SECRET").ok(),

            request_timeout_ms: env::var("REQUEST_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            sns_endpoint: env::var("SNS_ENDPOINT").ok().or_else(|| {
                // Serverless-offline style local SNS
                env::var("IS_OFFLINE")
                    .ok()
                    .map(|_| "http://127.0.0.1:4002".to_string())
            }),

            log_event_body: parse_flag("LOG_EVENT_BODY"),
            log_sns_message_body: parse_flag("LOG_SNS_MESSAGE_BODY"),
            log_fetch_body: parse_flag("LOG_FETCH_BODY"),
        }
    }

    /// Timeout for outbound HTTP calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The relay target, if configured with a non-blank value.
    pub fn target_endpoint(&self) -> Option<&str> {
        self.target_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The webhook shared secret, if configured with a non-blank value.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// Parse an opt-in boolean flag. Set-and-truthy means enabled.
fn parse_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let v = v.trim();
            !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
        }
        Err(_) => false,
    }
}
