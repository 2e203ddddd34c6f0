//! Utilities shared by the connectors

pub mod retry;

pub use retry::{RetryConfig, retry, retry_if, retry_with_backoff};
