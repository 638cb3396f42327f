//! SNS entry point: envelope types, header classification, signature
//! verification, and the two message handlers.
//!
//! ## Processing flow
//!
//! ```text
//! POST /sns → SnsHeaderStage → SnsVerifyStage → JsonBodyParser
//!              └→ SubscriptionConfirmation: GET SubscribeURL
//!              └→ Notification: POST Message to TARGET_ENDPOINT
//! ```

pub mod confirm;
pub mod envelope;
pub mod headers;
pub mod relay;
pub mod verify;

pub use confirm::confirm_subscription;
pub use envelope::{MessageType, SnsEnvelope, SNS_AGENT};
pub use headers::{classify, SnsHeaderStage, MESSAGE_TYPE_HEADER, TOPIC_ARN_HEADER};
pub use relay::relay_notification;
pub use verify::SnsVerifyStage;
