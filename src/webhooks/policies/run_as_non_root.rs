//! Run-as-non-root policy.
//!
//! Validates:
//! - `runAsNonRoot` resolves to `true` for every container
//! - No container resolves `runAsUser` to UID 0
//!
//! Container-level settings override the pod-level security context.

use k8s_openapi::api::core::v1::Container;

use super::{PolicyError, ValidationContext, ValidationResult};
use crate::resources::effective_user;

pub const POLICY_NAME: &str = "verify-container-run-as-non-root";

const ROOT_UID: i64 = 0;

fn may_run_as_root(ctx: &ValidationContext<'_>, container: &Container) -> bool {
    let user = effective_user(container, ctx.pod_spec.security_context.as_ref());
    user.run_as_user == Some(ROOT_UID) || user.run_as_non_root != Some(true)
}

/// Deny containers that may run as root
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::RunAsRoot, |c| may_run_as_root(ctx, c))
}
