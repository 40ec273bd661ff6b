//! Container security policies for pod admission.
//!
//! Every policy shares one contract: it scans all containers of the pod spec
//! held by a [`ValidationContext`] and returns a [`ValidationResult`]. A policy
//! fails if and only if at least one container offends, and the failure always
//! carries every offending container.
//!
//! Policies are plain functions registered by name in a [`PolicyRegistry`].

pub mod capabilities;
pub mod host_ports;
pub mod privilege_escalation;
pub mod privileged;
pub mod run_as_non_root;

use std::fmt;

use k8s_openapi::api::core::v1::{Container, PodSpec};
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed policy violation identities, one per policy
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyError {
    #[error("unable to permit container adding escalated capabilities")]
    AddCapabilities,

    #[error("unable to permit container missing either drop capabilities of ALL or NET_RAW")]
    MissingDropCapabilities,

    #[error("unable to permit privileged container")]
    Privileged,

    #[error("unable to permit container without allowPrivilegeEscalation set to false")]
    PrivilegeEscalation,

    #[error("unable to permit container that may run as root")]
    RunAsRoot,

    #[error("unable to permit container binding host ports")]
    HostPorts,
}

/// A policy violation together with every container that caused it
#[derive(Debug, Clone)]
pub struct PolicyFailure {
    pub error: PolicyError,
    pub containers: Vec<Container>,
}

impl PolicyFailure {
    /// Names of the offending containers, in pod spec order
    pub fn container_names(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Display for PolicyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}]", self.error, self.container_names().join(", "))
    }
}

impl std::error::Error for PolicyFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Result of a single policy check
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the policy passed
    pub allowed: bool,
    /// The violation (if not allowed)
    pub failure: Option<PolicyFailure>,
}

impl ValidationResult {
    /// Create an allowed result
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            failure: None,
        }
    }

    /// Offending containers, empty when the policy passed
    pub fn offending(&self) -> &[Container] {
        self.failure
            .as_ref()
            .map(|f| f.containers.as_slice())
            .unwrap_or_default()
    }
}

/// Context for validating one pod spec
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The pod spec being validated
    pub pod_spec: &'a PodSpec,
}

impl<'a> ValidationContext<'a> {
    pub fn new(pod_spec: &'a PodSpec) -> Self {
        Self { pod_spec }
    }

    /// Containers scanned by every policy
    pub fn containers(&self) -> &'a [Container] {
        &self.pod_spec.containers
    }

    /// Report a policy failure for the given offending containers.
    ///
    /// Always returns a denied result.
    pub fn failed(&self, error: PolicyError, containers: Vec<Container>) -> ValidationResult {
        let failure = PolicyFailure { error, containers };
        debug!(
            error = %failure.error,
            containers = ?failure.container_names(),
            "Policy violation"
        );
        ValidationResult {
            allowed: false,
            failure: Some(failure),
        }
    }

    /// Collect every container matching `offends` and turn the set into a result.
    pub(crate) fn check<F>(&self, error: PolicyError, offends: F) -> ValidationResult
    where
        F: Fn(&Container) -> bool,
    {
        let offending: Vec<Container> = self
            .containers()
            .iter()
            .filter(|&c| offends(c))
            .cloned()
            .collect();

        if offending.is_empty() {
            return ValidationResult::allowed();
        }

        self.failed(error, offending)
    }
}

/// Signature shared by every policy
pub type PolicyFn = fn(&ValidationContext<'_>) -> ValidationResult;

/// A named policy
#[derive(Clone, Copy)]
pub struct Policy {
    pub name: &'static str,
    pub validate: PolicyFn,
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy").field("name", &self.name).finish()
    }
}

/// Aggregate verdict of every registered policy
#[derive(Debug, Clone, Default)]
pub struct AdmissionDecision {
    /// Failures keyed by policy name, in registry order
    pub failures: Vec<(&'static str, PolicyFailure)>,
}

impl AdmissionDecision {
    pub fn allowed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Combined human-readable denial message
    pub fn message(&self) -> String {
        self.failures
            .iter()
            .map(|(name, failure)| format!("[{}] {}", name, failure))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Ordered set of policies evaluated for each admission request
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: Vec<Policy>,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
            .register(capabilities::ADD_CAPABILITIES_POLICY, capabilities::validate_add)
            .register(capabilities::DROP_CAPABILITIES_POLICY, capabilities::validate_drop)
            .register(privileged::POLICY_NAME, privileged::validate)
            .register(privilege_escalation::POLICY_NAME, privilege_escalation::validate)
            .register(run_as_non_root::POLICY_NAME, run_as_non_root::validate)
            .register(host_ports::POLICY_NAME, host_ports::validate)
    }
}

impl PolicyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
        }
    }

    /// Append a policy. Evaluation follows registration order.
    pub fn register(mut self, name: &'static str, validate: PolicyFn) -> Self {
        self.policies.push(Policy { name, validate });
        self
    }

    /// Remove policies by name. Unknown names are logged and ignored.
    pub fn without<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for name in names {
            let name = name.as_ref();
            let before = self.policies.len();
            self.policies.retain(|p| p.name != name);
            if self.policies.len() == before {
                warn!(policy = %name, "Cannot disable unknown policy");
            }
        }
        self
    }

    /// Names of the registered policies, in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name).collect()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Run every registered policy and combine the verdicts.
    ///
    /// All policies run; a failure does not short-circuit the rest.
    pub fn validate_all(&self, ctx: &ValidationContext<'_>) -> AdmissionDecision {
        let failures = self
            .policies
            .iter()
            .filter_map(|policy| {
                let result = (policy.validate)(ctx);
                result.failure.map(|failure| (policy.name, failure))
            })
            .collect();

        AdmissionDecision { failures }
    }
}
