//! Webhook module for validating pod admission requests.
//!
//! The server decodes AdmissionReview requests, extracts the pod spec from
//! the admitted workload and runs every registered container security policy.

pub mod policies;
mod server;

pub use policies::{
    AdmissionDecision, PolicyError, PolicyFailure, PolicyRegistry, ValidationContext,
    ValidationResult,
};
pub use server::{
    WebhookError, WebhookState, create_webhook_router, review, review_object, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
