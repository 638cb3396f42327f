//! SNSBridge - bridge between an SNS topic and plain HTTP parties.
//!
//! This library backs the `snsbridge-web` binary, a small web server with
//! two entry points:
//! - `POST /sns`: receives Notification and SubscriptionConfirmation
//!   requests from SNS, verifies them, and either completes the
//!   subscription handshake or relays the message payload downstream
//! - `POST /webhook`: receives third-party payloads and republishes them
//!   onto the configured topic
//!
//! ## Architecture
//!
//! ```text
//! SNS ─→ /sns ─→ pipeline ─→ confirm handshake │ relay to TARGET_ENDPOINT
//! Producer ─→ /webhook ─→ pipeline ─→ publish to TOPIC_ARN ─→ SNS
//! ```
//!
//! Every failure maps to a status code chosen for its retry implication:
//! 4xx tells SNS the request is permanently rejected, 5xx asks it to
//! redeliver later.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod sns;
pub mod util;
pub mod web;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use publish::{SnsTopicPublisher, TopicPublisher};
pub use web::AppState;
