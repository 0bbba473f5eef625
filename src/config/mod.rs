//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! plugin.register_flags(FlagSet)      (declaration, per plugin, in order)
//!     → flags::parse(specs, argv)     (single parse during init)
//!     → FlagValues (immutable)
//!     → plugin.configure(&FlagValues)
//! ```
//!
//! # Design Decisions
//! - No global mutable flag state: all writes happen during the
//!   single-threaded init phase, before any concurrent work
//! - Options are namespaced `<plugin-name>-<option>` so plugins cannot
//!   collide accidentally

pub mod flags;

pub use flags::{FlagError, FlagSet, FlagSpec, FlagValues};
