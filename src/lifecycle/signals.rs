//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGTERM/SIGINT into the runtime's shutdown path
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The future resolves once; the caller then drives `ServiceRuntime::stop`

/// Wait for a shutdown signal (Ctrl-C, or SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
