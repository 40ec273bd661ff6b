//! Privilege escalation policy.
//!
//! Containers must explicitly set `allowPrivilegeEscalation: false`. Leaving
//! the field unset lets the runtime default (allowed) apply, so absence offends.

use super::{PolicyError, ValidationContext, ValidationResult};
use crate::resources::get_security_context;

pub const POLICY_NAME: &str = "verify-container-privilege-escalation";

/// Deny containers that do not disable privilege escalation
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::PrivilegeEscalation, |c| {
        get_security_context(c).allow_privilege_escalation != Some(false)
    })
}
