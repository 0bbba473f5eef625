//! Plugin capability contract.
//!
//! # Responsibilities
//! - Define the uniform lifecycle contract every managed subsystem implements
//! - Track per-plugin lifecycle state (monotonic, one-directional)
//!
//! # Design Decisions
//! - `configure` and `run` return immediately; blocking resource use lives in
//!   spawned background tasks
//! - `stop` is "begin stopping": it hands back a one-shot completion signal
//!   instead of blocking the caller
//! - `stop` before `Running` is a safe no-op that still signals completion

use std::any::Any;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::config::flags::{FlagSet, FlagValues};

/// Failure modes of plugin lifecycle calls.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The underlying resource (listener bind, connection) could not be
    /// established.
    #[error("configure failed: {0}")]
    Configure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The plugin could not begin serving.
    #[error("start failed: {0}")]
    Start(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Lifecycle state of a managed plugin.
///
/// Transitions only move forward; a stopped plugin is never reconfigured
/// or rerun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginState {
    Created,
    FlagsRegistered,
    Configured,
    Running,
    Stopped,
}

impl PluginState {
    /// Whether moving to `next` keeps the state machine monotonic.
    pub fn can_advance(self, next: PluginState) -> bool {
        next > self
    }
}

/// A managed subsystem with a uniform lifecycle.
///
/// The orchestrator drives implementations through
/// `register_flags -> configure -> run -> stop` in registration order and
/// never calls backward.
#[async_trait]
pub trait Plugin: Send + 'static {
    /// Stable identity, used for logging and flag namespacing.
    fn name(&self) -> &str;

    /// Declare the plugin's configuration surface.
    ///
    /// Options land in the process flag set as `<name>-<option>`. Called
    /// exactly once per process, before any flag parsing.
    fn register_flags(&self, flags: &mut FlagSet);

    /// Establish the live resource (bind, connect).
    ///
    /// Must not block beyond resource acquisition; serving happens in
    /// background tasks started by [`Plugin::run`].
    async fn configure(&mut self, flags: &FlagValues) -> Result<(), PluginError>;

    /// Begin serving in the background. Returns once serving has been
    /// scheduled, not once it has finished starting.
    async fn run(&mut self) -> Result<(), PluginError>;

    /// Initiate graceful shutdown.
    ///
    /// The returned receiver fires exactly once, when shutdown of the
    /// underlying resource has completed. Implementations must signal even
    /// when called before the plugin ever ran.
    fn stop(&mut self) -> oneshot::Receiver<()>;

    /// Downcast hook for post-registration wiring (e.g. attaching a router
    /// to the listener plugin before `init`).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A completion signal that fires immediately.
///
/// Used by plugins whose `stop` has nothing to wait for, including the
/// stop-before-running case.
pub fn completed_signal() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(());
    rx
}
