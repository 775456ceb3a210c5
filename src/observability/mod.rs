//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, server, client produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured log level
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
