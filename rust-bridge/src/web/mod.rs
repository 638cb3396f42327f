//! Web server module: application state, route handlers, router.
//!
//! Two entry points compose from the shared pipeline:
//! - `POST /sns`: notification path (header stage, verifier, body parse,
//!   then dispatch on message type)
//! - `POST /webhook`: webhook ingress (content-type, body parse, schema,
//!   secret, publish)
//!
//! Failures become JSON error bodies through `ApiError`'s `IntoResponse`;
//! handlers never build error responses by hand.

pub mod handlers;

pub use handlers::{health, router, sns_message, webhook, Ack, AppState, HealthResponse};
