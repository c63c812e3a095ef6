//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, Authorization header)
//!     → policy.rs (required trust level for this method and path)
//!     → middleware.rs (public: pass through; protected: verify)
//!     → claims.rs (structural decode of the bearer token)
//!     → verifier.rs (timestamps, issuer trust, signature)
//!     → keys.rs (issuer key sets, cached with a refresh window)
//!     → Accepted: Credential extension on the request
//!     → Rejected: 401, reason in logs and metrics only
//! ```
//!
//! # Design Decisions
//! - Verification is a fixed check order with one reason per rejection
//! - Trusted issuers and rules are immutable after startup
//! - The verified credential is request-scoped and carries the raw
//!   token for upstream relay

pub mod claims;
pub mod keys;
pub mod middleware;
pub mod policy;
pub mod verifier;

pub use keys::{HttpKeyProvider, KeyCache, KeyProvider, StaticKeyProvider, TrustedIssuer};
pub use middleware::{authorize_middleware, AuthState};
pub use policy::{Access, AuthorizationPolicy};
pub use verifier::{AuthError, Credential, TokenVerifier};
