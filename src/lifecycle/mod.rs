//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config + RouteTable → Dispatcher
//!     → listen = true:  bind → spawn server task
//!     → listen = false: hand the Dispatcher back for in-process use
//!
//! Shutdown (shutdown.rs):
//!     trigger() or Ctrl+C → server stops accepting → in-flight requests drain
//! ```
//!
//! # Design Decisions
//! - Whether to listen is explicit configuration, never inferred from the environment
//! - Fail fast: a bind error is returned to the caller

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{launch, Launched, StartupError};
