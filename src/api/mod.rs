//! Access to the hosted backend
//!
//! Remote procedures and table reads go through [`BackendClient`]; sign-in,
//! sign-up and admin role changes go through [`AuthManager`].

pub mod auth;
pub mod backend;
pub mod client;
pub mod constants;
pub mod models;
pub mod resilience;

pub use auth::{AuthManager, SignUpOutcome};
pub use backend::ImportBackend;
pub use client::BackendClient;
pub use models::{Role, Session, SessionUser, ValidationIssue, ValidationReport, ValidationStatus};
pub use resilience::{FailureKind, RetryConfig, RetryPolicy};
