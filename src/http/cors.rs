//! Cross-origin policy stage.
//!
//! # Responsibilities
//! - Answer preflight requests without invoking any other stage
//! - Merge policy headers into every outbound response, including
//!   errors produced inside the pipeline
//!
//! # Design Decisions
//! - This stage is the single source of cross-origin headers; values
//!   an upstream sets for the same headers are overwritten
//! - A wildcard origin combined with credentials is rejected at
//!   startup, never discovered at request time

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use thiserror::Error;

use crate::config::CorsConfig;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum CorsPolicyError {
    #[error("wildcard origin cannot be combined with credentials")]
    WildcardWithCredentials,
    #[error("invalid cors header value '{0}'")]
    InvalidValue(String),
}

/// Immutable cross-origin policy, precomputed at startup.
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsPolicyError> {
        if config.allow_credentials && config.allow_origin == "*" {
            return Err(CorsPolicyError::WildcardWithCredentials);
        }
        let expose_headers = if config.expose_headers.is_empty() {
            None
        } else {
            Some(header_value(&config.expose_headers.join(", "))?)
        };
        Ok(Self {
            allow_origin: header_value(&config.allow_origin)?,
            allow_methods: header_value(&config.allow_methods.join(", "))?,
            allow_headers: header_value(&config.allow_headers.join(", "))?,
            expose_headers,
            allow_credentials: config.allow_credentials,
            max_age: header_value(&config.max_age_secs.to_string())?,
        })
    }

    /// Fixed 200 response answering a preflight.
    pub fn preflight_response(&self) -> Response {
        let mut response = Response::new(Body::empty());
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        response
    }

    /// Merge policy headers into an outbound response.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(expose) = &self.expose_headers {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
        }
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, CorsPolicyError> {
    HeaderValue::from_str(raw).map_err(|_| CorsPolicyError::InvalidValue(raw.to_string()))
}

/// Outermost custom stage. Preflights stop here; everything else gets
/// policy headers on the way out, whatever stage produced the response.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answering preflight");
        metrics::record_preflight();
        return policy.preflight_response();
    }

    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}
