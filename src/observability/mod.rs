//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → metrics.rs (counters, histograms)
//!     → tracing events (structured fields, request id)
//!
//! Consumers:
//!     → Metrics endpoint (Prometheus scrape)
//!     → Log aggregation (stdout)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments)
//! - Route label is the route id, never the raw path
//! - The tracing subscriber is installed in main, not here

pub mod metrics;
