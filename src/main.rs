//! Demo service wired on the servicekit runtime.
//!
//! Registers the backing-store connections before the listener (later
//! plugins may assume earlier ones are configured), attaches the route
//! table, then drives init → start → signal wait → bounded stop.

use std::process::exit;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use servicekit::http::HttpServerPlugin;
use servicekit::lifecycle::{shutdown_signal, ServiceRuntime};
use servicekit::net::ConnPlugin;
use servicekit::observability::logging;
use servicekit::AppError;

const SERVICE_NAME: &str = "demo-service";
const SERVICE_VERSION: &str = "1.0.0";

const PLUGIN_DB: &str = "db";
const PLUGIN_CACHE: &str = "cache";
const PLUGIN_HTTP: &str = "http";

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "msg": "pong" }))
}

/// Sample handler demonstrating the structured error path.
async fn whoami() -> Result<Json<serde_json::Value>, AppError> {
    Err(AppError::token_invalid())
}

fn router() -> Router {
    Router::new()
        .route("/", get(ping))
        .route("/ping", get(ping))
        .route("/me", get(whoami))
}

#[tokio::main]
async fn main() {
    logging::init("servicekit=debug,tower_http=debug");

    let mut runtime = ServiceRuntime::new(SERVICE_NAME, SERVICE_VERSION);
    tracing::info!(service = runtime.name(), version = runtime.version(), "starting");
    runtime.register(Box::new(ConnPlugin::new("main", PLUGIN_DB)));
    runtime.register(Box::new(ConnPlugin::new("main", PLUGIN_CACHE)));
    runtime.register(Box::new(HttpServerPlugin::new(PLUGIN_HTTP)));

    runtime
        .must_get_as::<HttpServerPlugin>(PLUGIN_HTTP)
        .set_router(router());

    // Configuration failure is fatal; partially configured plugins are left
    // as-is and the process exits.
    if let Err(e) = runtime.init().await {
        tracing::error!(error = %e, "service initialization failed");
        exit(1);
    }

    if let Err(e) = runtime.start().await {
        tracing::error!(error = %e, "service failed to start");
        exit(1);
    }

    shutdown_signal().await;

    if let Err(e) = runtime.stop(SHUTDOWN_TIMEOUT).await {
        tracing::error!(error = %e, "graceful shutdown incomplete");
        exit(1);
    }

    tracing::info!("shutdown complete");
}
