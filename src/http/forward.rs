//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rebuild the request URI against the matched upstream
//! - Copy headers, propagate the request id, apply route header
//!   injections
//! - Relay the verified credential, when one rode in on the request
//! - Enforce the per-upstream timeout
//!
//! # Design Decisions
//! - The body streams through unbuffered in both directions
//! - Credential relay happens here, at the one place every forwarded
//!   request passes, so it cannot be skipped by a routing path
//! - An inbound Authorization header on a public request is forwarded
//!   verbatim; only a verified credential replaces it

use axum::{
    body::Body,
    http::{
        header,
        uri::{Parts, PathAndQuery, Scheme},
        HeaderValue, Request, Uri,
    },
    response::Response,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::str::FromStr;
use std::time::Duration;

use crate::auth::Credential;
use crate::error::GatewayError;
use crate::http::request::X_REQUEST_ID;
use crate::routing::ForwardTarget;

/// Shared HTTP client for upstream calls.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Forward a request to the target the route table computed for it.
pub async fn forward(
    client: &UpstreamClient,
    target: &ForwardTarget,
    request: Request<Body>,
    request_id: &str,
    timeout: Duration,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();

    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{}?{}", target.path, query),
        None => target.path.clone(),
    };
    let uri = upstream_uri(&target.upstream, &path_and_query)?;

    let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        // Host must name the upstream, not the gateway.
        if let Some(authority) = target.upstream.authority() {
            if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                headers.insert(header::HOST, host);
            }
        }
        if let Ok(id) = HeaderValue::from_str(request_id) {
            headers.insert(X_REQUEST_ID, id);
        }
        for (name, value) in &target.headers {
            headers.insert(name.clone(), value.clone());
        }

        if let Some(credential) = parts.extensions.get::<Credential>() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", credential.raw)) {
                headers.insert(header::AUTHORIZATION, value);
            }
        }
    }

    let outbound = builder
        .body(body)
        .map_err(|error| GatewayError::UpstreamUnavailable(error.to_string()))?;

    match tokio::time::timeout(timeout, client.request(outbound)).await {
        Ok(Ok(response)) => {
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Ok(Err(error)) => {
            tracing::error!(
                request_id = %request_id,
                route = %target.route_id,
                error = %error,
                "Upstream request failed"
            );
            Err(GatewayError::UpstreamUnavailable(error.to_string()))
        }
        Err(_) => {
            tracing::error!(
                request_id = %request_id,
                route = %target.route_id,
                timeout_secs = timeout.as_secs(),
                "Upstream did not respond in time"
            );
            Err(GatewayError::UpstreamTimeout)
        }
    }
}

/// The upstream URI with the transformed path and original query.
fn upstream_uri(upstream: &Uri, path_and_query: &str) -> Result<Uri, GatewayError> {
    let mut parts = Parts::default();
    parts.scheme = upstream.scheme().cloned().or(Some(Scheme::HTTP));
    parts.authority = upstream.authority().cloned();
    parts.path_and_query = Some(
        PathAndQuery::from_str(path_and_query)
            .map_err(|error| GatewayError::UpstreamUnavailable(error.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|error| GatewayError::UpstreamUnavailable(error.to_string()))
}
