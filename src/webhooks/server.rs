//! Admission webhook server.
//!
//! Provides the `/validate` endpoint for a ValidatingWebhookConfiguration
//! matching pods and pod-templating workloads.
//!
//! To enable the webhook:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at `/validate`
//! 3. Mount the TLS certificate secret at /etc/webhook/certs/

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::{DynamicObject, TypeMeta};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::health::HealthState;
use crate::resources::extract_pod_spec;
use crate::webhooks::policies::{PolicyRegistry, ValidationContext};

/// Shared state for webhook handlers
pub struct WebhookState {
    pub registry: PolicyRegistry,
    pub health_state: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(registry: PolicyRegistry, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            registry,
            health_state,
        }
    }
}

fn operation_name(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason(
    request: &AdmissionRequest<DynamicObject>,
    message: &str,
    reason: &str,
) -> AdmissionResponse {
    AdmissionResponse::from(request).deny(format!("[{}] {}", reason, message))
}

/// The object under review, with type information filled in from the request
/// when the object itself omits it.
pub fn review_object(request: &AdmissionRequest<DynamicObject>) -> Option<DynamicObject> {
    let mut object = request.object.clone()?;
    if object.types.is_none() {
        let gvk = &request.kind;
        let api_version = if gvk.group.is_empty() {
            gvk.version.clone()
        } else {
            format!("{}/{}", gvk.group, gvk.version)
        };
        object.types = Some(TypeMeta {
            api_version,
            kind: gvk.kind.clone(),
        });
    }
    Some(object)
}

/// Evaluate an admission request against the registered policies.
///
/// Every outcome, including DELETE and malformed requests, is recorded in
/// the admission metrics.
pub fn review(
    state: &WebhookState,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let started = Instant::now();
    let response = evaluate(state, request);

    if let Some(health) = &state.health_state {
        health.metrics.record_admission(
            operation_name(&request.operation),
            response.allowed,
            started.elapsed().as_secs_f64(),
        );
    }

    response
}

fn evaluate(state: &WebhookState, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
    let uid = &request.uid;
    debug!(
        uid = %uid,
        operation = ?request.operation,
        kind = %request.kind.kind,
        namespace = ?request.namespace,
        name = %request.name,
        "Processing admission request"
    );

    // DELETE operations are always allowed
    if request.operation == Operation::Delete {
        info!(uid = %uid, "Admission request allowed (DELETE)");
        return AdmissionResponse::from(request);
    }

    let Some(object) = review_object(request) else {
        error!(uid = %uid, "Missing object in request");
        return deny_with_reason(request, "Missing object in request", "InvalidRequest");
    };

    let pod_spec = match extract_pod_spec(&object) {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            debug!(uid = %uid, kind = %request.kind.kind, "Kind carries no pod spec, allowing");
            return AdmissionResponse::from(request);
        }
        Err(e) => {
            warn!(uid = %uid, error = %e, "Failed to extract pod spec");
            return deny_with_reason(request, &e.to_string(), "InvalidRequest");
        }
    };

    let ctx = ValidationContext::new(&pod_spec);
    let decision = state.registry.validate_all(&ctx);

    if let Some(health) = &state.health_state {
        for (policy, _) in &decision.failures {
            health.metrics.record_violation(policy);
        }
    }

    if !decision.allowed() {
        let message = decision.message();
        warn!(uid = %uid, message = %message, "Admission request denied");
        return deny_with_reason(request, &message, "PolicyViolation");
    }

    info!(uid = %uid, "Admission request allowed");
    AdmissionResponse::from(request)
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/validate", post(validate_pod))
        .with_state(state)
}

/// Pod security admission webhook handler
async fn validate_pod(
    State(state): State<Arc<WebhookState>>,
    Json(review_request): Json<AdmissionReview<DynamicObject>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<DynamicObject> = match review_request.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    (StatusCode::OK, Json(review(&state, &request).into_review()))
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Wait for the server to bind, then flip readiness on.
async fn mark_ready_when_listening(
    handle: axum_server::Handle,
    health_state: Option<Arc<HealthState>>,
) {
    match handle.listening().await {
        Some(addr) => {
            info!(%addr, "Webhook server listening with TLS");
            if let Some(health) = &health_state {
                health.set_ready(true).await;
            }
        }
        None => warn!("Webhook server stopped before binding"),
    }
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on `port` and serves the /validate endpoint.
/// TLS certificates are loaded from the paths specified.
///
/// # Arguments
/// * `state` - Registry and optional health state shared by handlers
/// * `port` - Listen port
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_webhook_server(
    state: Arc<WebhookState>,
    port: u16,
    cert_path: &str,
    key_path: &str,
) -> Result<(), WebhookError> {
    use axum_server::Handle;
    use axum_server::tls_rustls::RustlsConfig;
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let health_state = state.health_state.clone();
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(PathBuf::from(cert_path), PathBuf::from(key_path))
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let handle = Handle::new();

    // Only report ready once the listener is bound
    tokio::spawn(mark_ready_when_listening(handle.clone(), health_state));

    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
