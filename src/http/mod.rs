//! HTTP pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → server.rs (Axum setup, layer composition = stage order)
//!     → request.rs (assign request ID)
//!     → cors.rs (preflight short-circuit, response header merge)
//!     → [auth layer decides access, verifies credential]
//!     → [route table picks the upstream and transforms the path]
//!     → forward.rs (rebuild URI, relay credential, call upstream)
//!     → Send to client, back out through cors.rs
//! ```

pub mod cors;
pub mod forward;
pub mod request;
pub mod server;

pub use cors::CorsPolicy;
pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
