//! Network resource plugins.
//!
//! # Design Decisions
//! - Backing-store connections (database, cache) share one lifecycle shape:
//!   connect during `configure`, idle while running, drop on `stop`
//! - Connection establishment is timeout-bounded so a dead backend fails
//!   `init` quickly instead of hanging it

pub mod conn;

pub use conn::ConnPlugin;
