//! Backing-store connection plugin.
//!
//! Carries the lifecycle-visible behavior of a database or cache
//! connection: the resource is established during `configure` (so plugins
//! registered later may assume it is reachable), stays open while the
//! service runs, and is dropped on `stop`.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::config::flags::{FlagSet, FlagValues};
use crate::plugin::{completed_signal, Plugin, PluginError};

const DEFAULT_CONNECT_TIMEOUT_SECS: &str = "5";

/// A managed TCP connection to a backing store.
pub struct ConnPlugin {
    label: String,
    name: String,
    stream: Option<TcpStream>,
}

impl ConnPlugin {
    /// `label` distinguishes multiple connections of the same kind
    /// ("main", "replica"); `name` is the plugin identity and flag prefix.
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
            stream: None,
        }
    }

    /// Whether the backing connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn flag(&self, option: &str) -> String {
        format!("{}-{}", self.name, option)
    }
}

#[async_trait]
impl Plugin for ConnPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_flags(&self, flags: &mut FlagSet) {
        flags.register("addr", "", "backing store address (host:port)");
        flags.register(
            "connect-timeout-secs",
            DEFAULT_CONNECT_TIMEOUT_SECS,
            "connection establishment timeout",
        );
    }

    async fn configure(&mut self, flags: &FlagValues) -> Result<(), PluginError> {
        let addr = match flags.get(&self.flag("addr")) {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => {
                return Err(PluginError::Configure(
                    format!("--{} is required", self.flag("addr")).into(),
                ))
            }
        };
        let timeout_secs = flags
            .get_u64(&self.flag("connect-timeout-secs"))
            .map_err(|e| PluginError::Configure(Box::new(e)))?;

        let connect = TcpStream::connect(addr.as_str());
        let stream = tokio::time::timeout(Duration::from_secs(timeout_secs), connect)
            .await
            .map_err(|_| {
                PluginError::Configure(
                    format!("connect to {addr} timed out after {timeout_secs}s").into(),
                )
            })?
            .map_err(|e| PluginError::Configure(Box::new(e)))?;

        tracing::info!(plugin = %self.name, label = %self.label, addr = %addr, "connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn run(&mut self) -> Result<(), PluginError> {
        // Connection is already live; nothing to schedule.
        tracing::debug!(plugin = %self.name, label = %self.label, "connection plugin running");
        Ok(())
    }

    fn stop(&mut self) -> oneshot::Receiver<()> {
        if self.stream.take().is_some() {
            tracing::info!(plugin = %self.name, label = %self.label, "connection closed");
        }
        completed_signal()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
