//! Linux capability policies.
//!
//! Validates:
//! - No container requests additional capabilities through `add`
//! - Every container drops `ALL` or at least `NET_RAW`

use k8s_openapi::api::core::v1::Container;

use super::{PolicyError, ValidationContext, ValidationResult};
use crate::resources::{get_security_context, has_required_capability};

pub const ADD_CAPABILITIES_POLICY: &str = "verify-add-container-capabilities";
pub const DROP_CAPABILITIES_POLICY: &str = "verify-drop-container-capabilities";

/// Capabilities of which at least one must be dropped
pub const REQUIRED_DROP_CAPABILITIES: &[&str] = &["ALL", "NET_RAW"];

fn requests_added_capabilities(container: &Container) -> bool {
    get_security_context(container)
        .capabilities
        .and_then(|caps| caps.add)
        .is_some_and(|add| !add.is_empty())
}

fn drops_required_capabilities(container: &Container) -> bool {
    get_security_context(container)
        .capabilities
        .and_then(|caps| caps.drop)
        .is_some_and(|drop| {
            !drop.is_empty() && has_required_capability(&drop, REQUIRED_DROP_CAPABILITIES)
        })
}

/// Deny containers that add capabilities beyond the runtime default
pub fn validate_add(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::AddCapabilities, requests_added_capabilities)
}

/// Deny containers that do not drop `ALL` or `NET_RAW`
pub fn validate_drop(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::MissingDropCapabilities, |c| {
        !drops_required_capabilities(c)
    })
}
