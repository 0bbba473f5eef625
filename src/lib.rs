//! servicekit: plugin lifecycle runtime with structured error recovery.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌──────────────────────────────────────────────────┐
//!                │                 SERVICE RUNTIME                  │
//!                │                                                  │
//!   argv ────────┼─▶ config::flags ──▶ lifecycle::orchestrator      │
//!                │      (parse once)     (init / start / stop)      │
//!                │                          │                       │
//!                │          ┌───────────────┼───────────────┐       │
//!                │          ▼               ▼               ▼       │
//!                │   ┌────────────┐  ┌────────────┐  ┌────────────┐ │
//!   Request ─────┼─▶ │ http plugin│  │ db conn    │  │ cache conn │ │
//!                │   │ (listener) │  │ plugin     │  │ plugin     │ │
//!                │   └─────┬──────┘  └────────────┘  └────────────┘ │
//!                │         │ recover middleware                     │
//!   Response ◀───┼─────────┴─ errors::AppError (structured JSON)    │
//!                └──────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator drives plugins through a monotonic lifecycle
//! (flags → configure → run → stop) in registration order, reversed for
//! shutdown. The listener plugin installs the recovery boundary so no
//! single request failure can terminate the process.

// Core subsystems
pub mod config;
pub mod errors;
pub mod plugin;

// Managed resources
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::flags::{FlagSet, FlagValues};
pub use errors::AppError;
pub use http::HttpServerPlugin;
pub use lifecycle::{LifecycleError, ServiceRuntime, Shutdown};
pub use net::ConnPlugin;
pub use plugin::{Plugin, PluginError, PluginState};
