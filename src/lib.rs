//! pod-security-webhook library crate
//!
//! Container security policies for Kubernetes admission control, plus the
//! admission webhook and health servers that host them.

pub mod config;
pub mod health;
pub mod resources;
pub mod webhooks;

pub use config::{ConfigError, WebhookConfig};
pub use health::HealthState;
pub use webhooks::{
    AdmissionDecision, PolicyError, PolicyFailure, PolicyRegistry, ValidationContext,
    ValidationResult, WebhookError, WebhookState, run_webhook_server,
};
