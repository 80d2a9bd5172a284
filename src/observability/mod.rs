//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured key-value logs, request IDs)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Logging is initialized in main (EnvFilter, RUST_LOG overrides config)
//! - Metric updates are cheap atomic operations
//! - The installer and the profile-defaulting path get dedicated counters
//!   because neither has any other externally observable signal

pub mod metrics;
