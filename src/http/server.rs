//! HTTP listener plugin.
//!
//! # Responsibilities
//! - Bind the TCP listener during `configure`
//! - Serve the registered router in a background task during `run`
//! - Wire the recovery boundary and observability layers in front of every
//!   handler
//! - Drain and stop on the shutdown trigger
//!
//! # Design Decisions
//! - The route table is collaborator-provided via `set_router`, attached
//!   after construction but before `init`
//! - Bind happens in `configure`, serving starts in `run`; neither blocks
//!   the lifecycle sequence

use std::any::Any;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderValue, Request};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::flags::{FlagSet, FlagValues};
use crate::http::recover::recover;
use crate::lifecycle::shutdown::Shutdown;
use crate::plugin::{completed_signal, Plugin, PluginError};

const DEFAULT_PORT: &str = "4000";
const DEFAULT_BIND: &str = "0.0.0.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request ID generation (UUID v4).
#[derive(Debug, Clone, Copy)]
struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// Network listener plugin serving the registered router over HTTP.
pub struct HttpServerPlugin {
    name: String,
    router: Option<Router>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    shutdown: Shutdown,
    serve_done: Option<oneshot::Receiver<()>>,
}

impl HttpServerPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            router: None,
            listener: None,
            local_addr: None,
            shutdown: Shutdown::new(),
            serve_done: None,
        }
    }

    /// Attach the route table. Must happen before `init`.
    pub fn set_router(&mut self, router: Router) {
        self.router = Some(router);
    }

    /// Address the listener is bound to. Available after `configure`;
    /// reflects the kernel-assigned port when bound to port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    fn flag(&self, option: &str) -> String {
        format!("{}-{}", self.name, option)
    }
}

#[async_trait]
impl Plugin for HttpServerPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_flags(&self, flags: &mut FlagSet) {
        flags.register("port", DEFAULT_PORT, "http listen port");
        flags.register("bind", DEFAULT_BIND, "http bind address");
    }

    async fn configure(&mut self, flags: &FlagValues) -> Result<(), PluginError> {
        let port = flags
            .get_u16(&self.flag("port"))
            .map_err(|e| PluginError::Configure(Box::new(e)))?;
        let bind = flags.get(&self.flag("bind")).unwrap_or(DEFAULT_BIND);

        let listener = TcpListener::bind((bind, port))
            .await
            .map_err(|e| PluginError::Configure(Box::new(e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| PluginError::Configure(Box::new(e)))?;

        tracing::info!(plugin = %self.name, address = %local_addr, "listener bound");

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        Ok(())
    }

    async fn run(&mut self) -> Result<(), PluginError> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| PluginError::Start("listener was not configured".into()))?;
        let router = self
            .router
            .take()
            .ok_or_else(|| PluginError::Start("no router registered".into()))?;

        // Recovery sits closest to the handlers; trace is outermost so it
        // observes recovered responses too.
        let app = router
            .layer(axum::middleware::from_fn(recover))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(SetRequestIdLayer::x_request_id(MakeUuidRequestId))
            .layer(TraceLayer::new_for_http());

        let mut shutdown_rx = self.shutdown.subscribe();
        let (done_tx, done_rx) = oneshot::channel();
        let name = self.name.clone();

        tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            });
            if let Err(e) = serve.await {
                tracing::error!(plugin = %name, error = %e, "http server error");
            }
            tracing::info!(plugin = %name, "http server stopped");
            let _ = done_tx.send(());
        });

        self.serve_done = Some(done_rx);
        Ok(())
    }

    fn stop(&mut self) -> oneshot::Receiver<()> {
        self.shutdown.trigger();
        match self.serve_done.take() {
            Some(rx) => rx,
            // Never ran; nothing to drain.
            None => completed_signal(),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
