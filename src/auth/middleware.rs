//! Authorization enforcement middleware.
//!
//! # Responsibilities
//! - Ask the policy what trust level the request needs
//! - Verify the bearer credential for protected paths
//! - Attach the verified credential as a request extension for relay
//!
//! # Design Decisions
//! - Rejections short-circuit here; a request that fails verification
//!   never reaches route matching
//! - The credential rides the request as an extension, never as shared
//!   state, so nothing can leak across requests

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::policy::{Access, AuthorizationPolicy};
use crate::auth::verifier::{AuthError, TokenVerifier};
use crate::error::GatewayError;
use crate::observability::metrics;

/// Shared authorization state, cloned per request.
#[derive(Clone)]
pub struct AuthState {
    pub policy: Arc<AuthorizationPolicy>,
    pub verifier: Arc<TokenVerifier>,
}

/// Enforce the authorization policy ahead of routing.
pub async fn authorize_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if state.policy.decide(&method, &path) == Access::Public {
        return next.run(request).await;
    }

    let token = match bearer_token(&request) {
        Some(token) => token,
        None => return reject(AuthError::MissingCredential, &method, &path),
    };

    match state.verifier.verify(&token).await {
        Ok(credential) => {
            request.extensions_mut().insert(credential);
            next.run(request).await
        }
        Err(error) => reject(error, &method, &path),
    }
}

/// The token from `Authorization: Bearer <token>`, if present.
fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn reject(error: AuthError, method: &Method, path: &str) -> Response {
    tracing::warn!(
        method = %method,
        path = %path,
        reason = error.reason(),
        error = %error,
        "Rejecting unauthenticated request"
    );
    metrics::record_auth_rejection(error.reason());
    GatewayError::Auth(error).into_response()
}
