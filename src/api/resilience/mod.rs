//! Retry handling for idempotent backend reads

pub mod retry;

pub use retry::{FailureKind, RetryConfig, RetryPolicy};
