//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → table.rs (first-match lookup in declaration order)
//!     → matcher.rs (evaluate path patterns)
//!     → filter.rs (strip prefix, rewrite, inject headers)
//!     → Return: ForwardTarget or explicit no-match
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile patterns and filters
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Declaration order is the contract; no priority field, no scoring
//! - Deterministic: same input always matches same route
//! - Regex appears only in rewrite filters, never in the match path

pub mod filter;
pub mod matcher;
pub mod path;
pub mod table;

pub use matcher::PathPattern;
pub use table::{ForwardTarget, Route, RouteTable};
