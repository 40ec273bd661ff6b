// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for pod-security-webhook.
//!
//! These tests run without a Kubernetes cluster and exercise the policy
//! registry and individual policies through the public API.

#[path = "../common/mod.rs"]
mod common;

use common::fixtures::{ContainerBuilder, PodSpecBuilder, restricted_container, single};
use pod_security_webhook::webhooks::policies::{capabilities, host_ports, privileged};
use pod_security_webhook::{PolicyError, PolicyRegistry, ValidationContext, ValidationResult};

fn offending_names(result: &ValidationResult) -> Vec<String> {
    result.offending().iter().map(|c| c.name.clone()).collect()
}

mod capability_scenarios {
    use super::*;

    #[test]
    fn test_drop_all_passes() {
        let spec = single(ContainerBuilder::new("app").drop_capabilities(&["ALL"]).build());
        let result = capabilities::validate_drop(&ValidationContext::new(&spec));
        assert!(result.allowed);
        assert!(result.failure.is_none());
    }

    #[test]
    fn test_drop_net_raw_passes() {
        let spec = single(
            ContainerBuilder::new("app")
                .drop_capabilities(&["NET_RAW"])
                .build(),
        );
        let result = capabilities::validate_drop(&ValidationContext::new(&spec));
        assert!(result.allowed);
    }

    #[test]
    fn test_added_capability_flags_only_that_container() {
        let spec = PodSpecBuilder::new()
            .container(
                ContainerBuilder::new("admin")
                    .add_capabilities(&["SYS_ADMIN"])
                    .build(),
            )
            .container(ContainerBuilder::new("plain").build())
            .build();

        let result = capabilities::validate_add(&ValidationContext::new(&spec));
        assert!(!result.allowed);
        assert_eq!(offending_names(&result), vec!["admin"]);
        assert_eq!(
            result.failure.unwrap().error,
            PolicyError::AddCapabilities
        );
    }

    #[test]
    fn test_drop_list_without_required_entry_fails() {
        let spec = single(ContainerBuilder::new("app").drop_capabilities(&["CHOWN"]).build());
        let result = capabilities::validate_drop(&ValidationContext::new(&spec));
        assert!(!result.allowed);
        assert_eq!(offending_names(&result), vec!["app"]);
    }

    #[test]
    fn test_absent_contexts_pass_add_and_fail_drop() {
        let spec = PodSpecBuilder::new()
            .container(ContainerBuilder::new("bare").build())
            .container(ContainerBuilder::new("empty").empty_security_context().build())
            .container(ContainerBuilder::new("no-lists").empty_capabilities().build())
            .build();
        let ctx = ValidationContext::new(&spec);

        assert!(capabilities::validate_add(&ctx).allowed);

        let drop = capabilities::validate_drop(&ctx);
        assert!(!drop.allowed);
        assert_eq!(offending_names(&drop), vec!["bare", "empty", "no-lists"]);
    }

    #[test]
    fn test_required_drop_names() {
        assert_eq!(capabilities::REQUIRED_DROP_CAPABILITIES, &["ALL", "NET_RAW"]);
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_restricted_pod_admitted() {
        let spec = PodSpecBuilder::new()
            .container(restricted_container("app"))
            .container(restricted_container("proxy"))
            .build();

        let decision = PolicyRegistry::default().validate_all(&ValidationContext::new(&spec));
        assert!(decision.allowed());
    }

    #[test]
    fn test_every_violation_reported() {
        let spec = PodSpecBuilder::new()
            .container(
                ContainerBuilder::new("bad")
                    .add_capabilities(&["NET_ADMIN"])
                    .drop_capabilities(&["ALL"])
                    .privileged(true)
                    .allow_privilege_escalation(false)
                    .run_as_non_root(true)
                    .port(80, Some(80))
                    .build(),
            )
            .container(restricted_container("good"))
            .build();

        let decision = PolicyRegistry::default().validate_all(&ValidationContext::new(&spec));
        assert!(!decision.allowed());

        let policies: Vec<_> = decision.failures.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            policies,
            vec![
                capabilities::ADD_CAPABILITIES_POLICY,
                privileged::POLICY_NAME,
                host_ports::POLICY_NAME,
            ]
        );
        for (_, failure) in &decision.failures {
            assert_eq!(failure.container_names(), vec!["bad"]);
        }

        let message = decision.message();
        assert!(message.contains(
            "[verify-container-privileged] unable to permit privileged container: [bad]"
        ));
        assert!(!message.contains("good"));
    }

    #[test]
    fn test_pod_level_non_root_satisfies_policy() {
        let spec = PodSpecBuilder::new()
            .pod_run_as_non_root(true)
            .container(
                ContainerBuilder::new("app")
                    .drop_capabilities(&["ALL"])
                    .allow_privilege_escalation(false)
                    .build(),
            )
            .build();

        let decision = PolicyRegistry::default().validate_all(&ValidationContext::new(&spec));
        assert!(decision.allowed());
    }

    #[test]
    fn test_root_uid_rejected() {
        let spec = single(
            ContainerBuilder::new("root")
                .drop_capabilities(&["ALL"])
                .allow_privilege_escalation(false)
                .run_as_non_root(true)
                .run_as_user(0)
                .build(),
        );

        let decision = PolicyRegistry::default().validate_all(&ValidationContext::new(&spec));
        assert_eq!(decision.failures.len(), 1);
        assert_eq!(decision.failures[0].1.error, PolicyError::RunAsRoot);
    }

    #[test]
    fn test_custom_registry() {
        let registry = PolicyRegistry::new()
            .register(capabilities::ADD_CAPABILITIES_POLICY, capabilities::validate_add);
        let spec = single(ContainerBuilder::new("bare").build());

        assert_eq!(registry.names(), vec!["verify-add-container-capabilities"]);
        assert!(registry.validate_all(&ValidationContext::new(&spec)).allowed());
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_policy_error_messages() {
        assert_eq!(
            PolicyError::AddCapabilities.to_string(),
            "unable to permit container adding escalated capabilities"
        );
        assert_eq!(
            PolicyError::MissingDropCapabilities.to_string(),
            "unable to permit container missing either drop capabilities of ALL or NET_RAW"
        );
    }

    #[test]
    fn test_policy_errors_compare_by_identity() {
        assert_eq!(PolicyError::Privileged, PolicyError::Privileged);
        assert_ne!(PolicyError::AddCapabilities, PolicyError::MissingDropCapabilities);
    }
}

mod webhook_contract_tests {
    use kube::core::DynamicObject;
    use pod_security_webhook::webhooks::{
        AdmissionRequest, AdmissionResponse, AdmissionReview, Operation, WebhookState, review,
    };
    use pod_security_webhook::{HealthState, PolicyRegistry};
    use serde_json::json;
    use std::sync::Arc;

    fn request(containers: serde_json::Value) -> AdmissionRequest<DynamicObject> {
        let review: AdmissionReview<DynamicObject> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "contract-uid",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "name": "web",
                "namespace": "default",
                "operation": "CREATE",
                "userInfo": {"username": "tester"},
                "object": {
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "web"},
                    "spec": {"containers": containers}
                },
                "dryRun": false
            }
        }))
        .unwrap();
        review.try_into().unwrap()
    }

    #[test]
    fn test_review_response_round_trips_uid() {
        let request = request(json!([{"name": "app"}]));
        assert_eq!(request.operation, Operation::Create);

        let health = Some(Arc::new(HealthState::new()));
        let state = WebhookState::new(PolicyRegistry::default(), health);
        let response: AdmissionResponse = review(&state, &request);
        assert!(!response.allowed);
        assert_eq!(response.uid, "contract-uid");

        let encoded = serde_json::to_value(response.into_review()).unwrap();
        assert_eq!(encoded["response"]["allowed"], json!(false));
        let message = encoded["response"]["status"]["message"].as_str().unwrap();
        assert!(message.starts_with("[PolicyViolation]"));
        assert!(message.contains("[app]"));
    }
}
