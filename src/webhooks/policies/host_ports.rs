//! Host port policy.
//!
//! Binding a host port ties the pod to a node and exposes it outside the pod
//! network. Any declared port with a non-zero `hostPort` offends.

use k8s_openapi::api::core::v1::Container;

use super::{PolicyError, ValidationContext, ValidationResult};

pub const POLICY_NAME: &str = "verify-container-host-ports";

fn binds_host_port(container: &Container) -> bool {
    container
        .ports
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|p| p.host_port.is_some_and(|port| port != 0))
}

/// Deny containers that bind host ports
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    ctx.check(PolicyError::HostPorts, binds_host_port)
}
