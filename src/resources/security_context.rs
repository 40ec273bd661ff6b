//! Security context accessors for container declarations.
//!
//! Provides pure lookups used by the validation policies to read a
//! container's effective security settings.

use k8s_openapi::api::core::v1::{Container, PodSecurityContext, SecurityContext};

/// Get the security context declared on a container.
///
/// Returns an empty `SecurityContext` when the container does not declare one,
/// so callers can inspect fields without handling the absent case separately.
pub fn get_security_context(container: &Container) -> SecurityContext {
    container.security_context.clone().unwrap_or_default()
}

/// Check whether any of the `required` capability names appear in `capabilities`.
///
/// Comparison is case-insensitive. Each required name is a sufficient
/// alternative: one match is enough.
pub fn has_required_capability(capabilities: &[String], required: &[&str]) -> bool {
    capabilities
        .iter()
        .any(|cap| required.iter().any(|name| cap.eq_ignore_ascii_case(name)))
}

/// Effective user settings for a container after merging the pod-level
/// security context underneath the container-level one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectiveUser {
    pub run_as_user: Option<i64>,
    pub run_as_non_root: Option<bool>,
}

/// Resolve the user a container runs as. Container settings override pod settings.
pub fn effective_user(
    container: &Container,
    pod_context: Option<&PodSecurityContext>,
) -> EffectiveUser {
    let container_context = get_security_context(container);

    EffectiveUser {
        run_as_user: container_context
            .run_as_user
            .or_else(|| pod_context.and_then(|p| p.run_as_user)),
        run_as_non_root: container_context
            .run_as_non_root
            .or_else(|| pod_context.and_then(|p| p.run_as_non_root)),
    }
}
