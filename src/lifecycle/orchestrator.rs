//! Plugin lifecycle orchestration.
//!
//! # Responsibilities
//! - Own the ordered plugin set (registration order is the contract)
//! - Drive plugins through flags → configure → run → stop
//! - Coordinate graceful shutdown with a bounded wait
//!
//! # Design Decisions
//! - Startup is sequential in registration order; later plugins may assume
//!   earlier ones are already configured
//! - Shutdown runs in strictly reverse order (dependents before their
//!   dependencies) and waits on all completion signals concurrently
//! - The first configure failure aborts the rest; partially configured
//!   plugins are left as-is and the process is expected to exit

use std::time::Duration;

use thiserror::Error;

use crate::config::flags::{self, FlagError, FlagSet, FlagValues};
use crate::plugin::{Plugin, PluginError, PluginState};

/// Lifecycle failures surfaced to the process entry point.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("plugin {plugin} failed to configure")]
    Configure {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("plugin {plugin} failed to start")]
    Start {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error(transparent)]
    Flags(#[from] FlagError),

    /// A lifecycle call would move a plugin's state machine backward.
    #[error("plugin {plugin} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        plugin: String,
        from: PluginState,
        to: PluginState,
    },

    #[error("shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

struct PluginEntry {
    plugin: Box<dyn Plugin>,
    state: PluginState,
}

/// Owns the ordered plugin set and sequences its lifecycle.
///
/// Exists once per process: built at startup, initialized once, torn down on
/// the shutdown signal.
pub struct ServiceRuntime {
    name: String,
    version: String,
    plugins: Vec<PluginEntry>,
    flags: Option<FlagValues>,
}

impl ServiceRuntime {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            plugins: Vec::new(),
            flags: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Register a plugin. Registration order is the startup order and the
    /// reverse of the shutdown order.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(PluginEntry {
            plugin,
            state: PluginState::Created,
        });
    }

    /// Parsed flag values. Available after `init`.
    pub fn flags(&self) -> Option<&FlagValues> {
        self.flags.as_ref()
    }

    /// Look up a plugin by name for post-registration wiring.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Plugin> {
        self.plugins
            .iter_mut()
            .find(|entry| entry.plugin.name() == name)
            .map(|entry| entry.plugin.as_mut())
    }

    /// Typed plugin lookup.
    ///
    /// Panics when the plugin is missing or of another type: wiring against
    /// an unregistered plugin is a programming error, not a runtime
    /// condition to recover from.
    pub fn must_get_as<P: Plugin>(&mut self, name: &str) -> &mut P {
        let plugin = self
            .get_mut(name)
            .unwrap_or_else(|| panic!("plugin {name} is not registered"));
        plugin
            .as_any_mut()
            .downcast_mut::<P>()
            .unwrap_or_else(|| panic!("plugin {name} has an unexpected type"))
    }

    /// Reject lifecycle calls that would move a plugin's state backward.
    ///
    /// No plugin may be re-configured or re-run after `Stopped`; re-driving
    /// an already initialized runtime is refused the same way.
    fn advance(entry: &PluginEntry, to: PluginState) -> Result<(), LifecycleError> {
        if entry.state.can_advance(to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                plugin: entry.plugin.name().to_string(),
                from: entry.state,
                to,
            })
        }
    }

    /// Initialize from process arguments (binary name excluded).
    pub async fn init(&mut self) -> Result<(), LifecycleError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.init_from(args).await
    }

    /// Register every plugin's flags in order, parse process configuration
    /// once, then configure every plugin in order.
    ///
    /// Aborts on the first configure failure; remaining plugins are never
    /// configured.
    pub async fn init_from<I, T>(&mut self, args: I) -> Result<(), LifecycleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut specs = Vec::new();
        for entry in &mut self.plugins {
            Self::advance(entry, PluginState::FlagsRegistered)?;
            let mut set = FlagSet::scoped(entry.plugin.name());
            entry.plugin.register_flags(&mut set);
            specs.extend(set.into_specs());
            entry.state = PluginState::FlagsRegistered;
        }

        let values = flags::parse(&specs, args)?;

        for entry in &mut self.plugins {
            Self::advance(entry, PluginState::Configured)?;
            let name = entry.plugin.name().to_string();
            tracing::info!(plugin = %name, "configuring plugin");
            if let Err(source) = entry.plugin.configure(&values).await {
                tracing::error!(plugin = %name, error = %source, "plugin configuration failed");
                return Err(LifecycleError::Configure {
                    plugin: name,
                    source,
                });
            }
            entry.state = PluginState::Configured;
        }

        self.flags = Some(values);
        Ok(())
    }

    /// Ask every plugin to run, in registration order.
    ///
    /// Non-blocking: returns once all plugins have been asked to run, not
    /// once they have finished starting.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        for entry in &mut self.plugins {
            Self::advance(entry, PluginState::Running)?;
            let name = entry.plugin.name().to_string();
            tracing::info!(plugin = %name, "starting plugin");
            if let Err(source) = entry.plugin.run().await {
                tracing::error!(plugin = %name, error = %source, "plugin failed to start");
                return Err(LifecycleError::Start {
                    plugin: name,
                    source,
                });
            }
            entry.state = PluginState::Running;
        }
        Ok(())
    }

    /// Stop every plugin in reverse registration order and wait for all
    /// completion signals, bounded by `timeout`.
    ///
    /// A dropped signal sender counts as completed; a plugin that never
    /// signals surfaces as `ShutdownTimeout` instead of hanging the process.
    pub async fn stop(&mut self, timeout: Duration) -> Result<(), LifecycleError> {
        let mut completions = Vec::new();
        for entry in self.plugins.iter_mut().rev() {
            tracing::info!(plugin = entry.plugin.name(), "stopping plugin");
            completions.push(entry.plugin.stop());
            if entry.state.can_advance(PluginState::Stopped) {
                entry.state = PluginState::Stopped;
            }
        }

        let wait = futures_util::future::join_all(completions);
        match tokio::time::timeout(timeout, wait).await {
            Ok(_) => {
                tracing::info!(service = %self.name, "all plugins stopped");
                Ok(())
            }
            Err(_) => Err(LifecycleError::ShutdownTimeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::any::Any;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    use crate::plugin::completed_signal;

    struct MockPlugin {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail_configure: bool,
        never_signal: bool,
    }

    impl MockPlugin {
        fn new(name: &'static str, calls: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                calls,
                fail_configure: false,
                never_signal: false,
            }
        }

        fn record(&self, call: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, call));
        }
    }

    #[async_trait]
    impl Plugin for MockPlugin {
        fn name(&self) -> &str {
            self.name
        }

        fn register_flags(&self, _flags: &mut FlagSet) {
            self.record("flags");
        }

        async fn configure(&mut self, _flags: &FlagValues) -> Result<(), PluginError> {
            self.record("configure");
            if self.fail_configure {
                return Err(PluginError::Configure("induced failure".into()));
            }
            Ok(())
        }

        async fn run(&mut self) -> Result<(), PluginError> {
            self.record("run");
            Ok(())
        }

        fn stop(&mut self) -> oneshot::Receiver<()> {
            self.record("stop");
            if self.never_signal {
                let (tx, rx) = oneshot::channel();
                // Leak the sender so the receiver stays pending forever.
                std::mem::forget(tx);
                rx
            } else {
                completed_signal()
            }
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn runtime_with(plugins: Vec<MockPlugin>) -> ServiceRuntime {
        let mut runtime = ServiceRuntime::new("test-service", "0.0.0");
        for plugin in plugins {
            runtime.register(Box::new(plugin));
        }
        runtime
    }

    #[tokio::test]
    async fn test_configure_runs_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = runtime_with(vec![
            MockPlugin::new("a", calls.clone()),
            MockPlugin::new("b", calls.clone()),
            MockPlugin::new("c", calls.clone()),
        ]);

        runtime.init_from(Vec::<String>::new()).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                "a:flags",
                "b:flags",
                "c:flags",
                "a:configure",
                "b:configure",
                "c:configure"
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_runs_in_reverse_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = runtime_with(vec![
            MockPlugin::new("a", calls.clone()),
            MockPlugin::new("b", calls.clone()),
            MockPlugin::new("c", calls.clone()),
        ]);

        runtime.init_from(Vec::<String>::new()).await.unwrap();
        runtime.start().await.unwrap();
        runtime.stop(Duration::from_secs(1)).await.unwrap();

        let calls = calls.lock().unwrap();
        let stops: Vec<_> = calls.iter().filter(|c| c.ends_with(":stop")).collect();
        assert_eq!(stops, vec!["c:stop", "b:stop", "a:stop"]);
    }

    #[tokio::test]
    async fn test_init_aborts_after_first_configure_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut failing = MockPlugin::new("b", calls.clone());
        failing.fail_configure = true;
        let mut runtime = runtime_with(vec![
            MockPlugin::new("a", calls.clone()),
            failing,
            MockPlugin::new("c", calls.clone()),
        ]);

        let err = runtime.init_from(Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Configure { ref plugin, .. } if plugin == "b"
        ));

        let calls = calls.lock().unwrap();
        assert!(calls.contains(&"b:configure".to_string()));
        assert!(!calls.contains(&"c:configure".to_string()));
    }

    #[tokio::test]
    async fn test_start_after_stop_is_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = runtime_with(vec![MockPlugin::new("a", calls.clone())]);

        runtime.init_from(Vec::<String>::new()).await.unwrap();
        runtime.start().await.unwrap();
        runtime.stop(Duration::from_secs(1)).await.unwrap();

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));

        // The stopped plugin was never re-run.
        let runs = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == "a:run")
            .count();
        assert_eq!(runs, 1);
    }

    #[tokio::test]
    async fn test_reinit_is_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = runtime_with(vec![MockPlugin::new("a", calls.clone())]);

        runtime.init_from(Vec::<String>::new()).await.unwrap();
        let err = runtime.init_from(Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));

        let configures = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == "a:configure")
            .count();
        assert_eq!(configures, 1);
    }

    #[tokio::test]
    async fn test_stop_before_running_still_signals_completion() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut plugin = MockPlugin::new("a", calls);

        // Never configured or run; stop must still complete exactly once.
        let rx = plugin.stop();
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_times_out_when_a_plugin_never_signals() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut stuck = MockPlugin::new("a", calls.clone());
        stuck.never_signal = true;
        let mut runtime = runtime_with(vec![stuck]);

        runtime.init_from(Vec::<String>::new()).await.unwrap();
        runtime.start().await.unwrap();

        let err = runtime.stop(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ShutdownTimeout(_)));
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut runtime = runtime_with(vec![
            MockPlugin::new("a", calls.clone()),
            MockPlugin::new("b", calls),
        ]);

        assert!(runtime.get_mut("b").is_some());
        assert!(runtime.get_mut("z").is_none());

        let plugin: &mut MockPlugin = runtime.must_get_as("a");
        assert_eq!(plugin.name, "a");
    }

    #[tokio::test]
    #[should_panic(expected = "not registered")]
    async fn test_must_get_unknown_plugin_panics() {
        let mut runtime = ServiceRuntime::new("test-service", "0.0.0");
        let _: &mut MockPlugin = runtime.must_get_as("ghost");
    }
}
