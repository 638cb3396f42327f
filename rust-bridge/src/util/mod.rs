//! Shared utilities.

pub mod redact;
