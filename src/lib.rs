//! Edge gateway in front of the backend services.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌─────────────────────────────────────────────────┐
//!                    │                  EDGE GATEWAY                   │
//!                    │                                                 │
//!  Client Request    │  ┌──────┐   ┌───────────────┐   ┌──────────┐   │
//!  ──────────────────┼─▶│ cors │──▶│ authorization │──▶│ routing  │   │
//!                    │  └──┬───┘   │  + verifier   │   │  table   │   │
//!                    │     │       └───────┬───────┘   └────┬─────┘   │
//!                    │     │ OPTIONS       │ 401            │         │
//!                    │     │               ▼                ▼         │
//!  Client Response   │  ┌──────┐       ┌───────┐      ┌──────────┐    │
//!  ◀─────────────────┼──│ cors │◀──────│ error │◀─────│ forward  │◀───┼── Upstream
//!                    │  └──────┘       └───────┘      └──────────┘    │
//!                    │                                                 │
//!                    │  Cross-cutting: config, observability           │
//!                    └─────────────────────────────────────────────────┘
//! ```
//!
//! Stage order is fixed: CORS (answers preflights before anything else
//! runs), authorization (consults the credential verifier on protected
//! paths), credential relay, route matching, forward. Every response,
//! errors raised inside the pipeline included, leaves through the CORS
//! stage.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
