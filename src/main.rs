//! pod-security-webhook - A validating admission webhook for container security contexts.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Starts the health server and the TLS webhook server

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use pod_security_webhook::health::{HealthState, run_health_server};
use pod_security_webhook::{PolicyRegistry, WebhookConfig, WebhookState, run_webhook_server};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pod_security_webhook=info".parse()?),
        )
        .json()
        .init();

    info!("Starting pod-security-webhook");

    let config = WebhookConfig::from_env()?;

    let registry = PolicyRegistry::default().without(&config.disabled_policies);
    info!(policies = ?registry.names(), "Registered policies");

    if !Path::new(&config.cert_path).exists() || !Path::new(&config.key_path).exists() {
        return Err(format!(
            "webhook certificates not found at {} and {}",
            config.cert_path, config.key_path
        )
        .into());
    }

    let health_state = Arc::new(HealthState::new());

    // Start health server immediately so liveness probes work during startup
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let webhook_handle = {
        let state = Arc::new(WebhookState::new(registry, Some(health_state.clone())));
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(
                state,
                config.webhook_port,
                &config.cert_path,
                &config.key_path,
            )
            .await
            {
                error!("Webhook server error: {}", e);
            }
        })
    };

    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the API server stops routing new reviews here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
