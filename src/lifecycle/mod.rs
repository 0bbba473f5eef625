//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (orchestrator.rs):
//!     register_flags (in order) → parse flags once → configure (in order)
//!     → run (in order, non-blocking)
//!
//! Shutdown (orchestrator.rs + shutdown.rs):
//!     Signal received → stop (reverse order) → join completion signals
//!     → ShutdownTimeout error after the deadline
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: registration order is the dependency contract
//! - Ordered shutdown: strictly reverse, dependents stop first
//! - Shutdown wait is timeout-bounded; a stuck plugin surfaces as an error

pub mod orchestrator;
pub mod shutdown;
pub mod signals;

pub use orchestrator::{LifecycleError, ServiceRuntime};
pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
