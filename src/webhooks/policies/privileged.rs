//! Privileged container policy.
//!
//! A privileged container has the same device and kernel access as processes
//! on the host. Containers declaring `privileged: true` are denied.

use super::{PolicyError, ValidationContext, ValidationResult};
use crate::resources::get_security_context;

pub const POLICY_NAME: &str = "verify-container-privileged";

/// Deny containers running in privileged mode
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::Privileged, |c| {
        get_security_context(c).privileged == Some(true)
    })
}
