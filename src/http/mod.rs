//! HTTP listener subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum serve loop, managed as a Plugin)
//!     → TraceLayer / request-id / timeout layers
//!     → recover.rs (panic → structured error boundary)
//!     → registered router (collaborator-provided handlers)
//! ```

pub mod recover;
pub mod server;

pub use recover::recover;
pub use server::HttpServerPlugin;
