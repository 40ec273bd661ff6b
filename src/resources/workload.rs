//! Pod spec extraction from admitted workload objects.
//!
//! The admission webhook receives untyped objects. Pods carry their spec at
//! `spec`; controllers that stamp out pods carry a pod template.

use k8s_openapi::api::core::v1::PodSpec;
use kube::core::DynamicObject;
use serde_json::Value;
use thiserror::Error;

/// Error decoding a pod spec out of an admitted object
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The object has no type information
    #[error("object is missing apiVersion/kind")]
    MissingTypeMeta,

    /// The expected pod spec path is absent
    #[error("{kind} is missing {path}")]
    MissingPodSpec { kind: String, path: &'static str },

    /// The pod spec failed to deserialize
    #[error("invalid pod spec in {kind}: {source}")]
    InvalidPodSpec {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON pointer to the pod spec for each supported workload kind.
///
/// Returns `None` for kinds that do not embed a pod spec.
pub fn pod_spec_pointer(kind: &str) -> Option<&'static str> {
    match kind {
        "Pod" => Some("/spec"),
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "Job"
        | "ReplicationController" => Some("/spec/template/spec"),
        "CronJob" => Some("/spec/jobTemplate/spec/template/spec"),
        _ => None,
    }
}

/// Extract the pod spec carried by an admitted object.
///
/// Returns `Ok(None)` when the object's kind does not embed a pod spec.
pub fn extract_pod_spec(object: &DynamicObject) -> Result<Option<PodSpec>, ExtractError> {
    let kind = object
        .types
        .as_ref()
        .map(|t| t.kind.as_str())
        .ok_or(ExtractError::MissingTypeMeta)?;

    let Some(pointer) = pod_spec_pointer(kind) else {
        return Ok(None);
    };

    let value = object
        .data
        .pointer(pointer)
        .cloned()
        .ok_or_else(|| ExtractError::MissingPodSpec {
            kind: kind.to_string(),
            path: pointer,
        })?;

    decode_pod_spec(kind, value).map(Some)
}

fn decode_pod_spec(kind: &str, value: Value) -> Result<PodSpec, ExtractError> {
    serde_json::from_value(value).map_err(|source| ExtractError::InvalidPodSpec {
        kind: kind.to_string(),
        source,
    })
}
