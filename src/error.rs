//! Gateway error handling.
//!
//! Authentication failures deliberately map to one opaque 401 body.
//! The detailed rejection reason stays in logs and metrics; callers
//! must not be able to distinguish a bad signature from an untrusted
//! issuer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// Request-level failure produced by a pipeline stage.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("no route matches the request path")]
    NoMatchingRoute,

    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream did not respond in time")]
    UpstreamTimeout,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NoMatchingRoute => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Body text exposed to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Auth(_) => "unauthorized",
            Self::NoMatchingRoute => "no matching route",
            Self::UpstreamUnavailable(_) => "upstream unavailable",
            Self::UpstreamTimeout => "upstream timeout",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}
