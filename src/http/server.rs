//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile validated configuration into pipeline values
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware so layer nesting is the stage order
//! - Bind server to listener, serve with graceful shutdown
//! - Dispatch matched requests to the forwarder
//!
//! # Design Decisions
//! - One handler for every method and path; the route table, not the
//!   axum router, decides where a request goes
//! - Construction fails on any policy the pipeline could not honor at
//!   request time (bad route, bad rule, credentialed wildcard origin)

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{
    authorize_middleware, AuthState, AuthorizationPolicy, HttpKeyProvider, TokenVerifier,
    TrustedIssuer,
};
use crate::config::{ConfigError, GatewayConfig, ValidationError};
use crate::error::GatewayError;
use crate::http::cors::{cors_middleware, CorsPolicy};
use crate::http::forward::{forward, UpstreamClient};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub client: UpstreamClient,
    pub upstream_timeout: Duration,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Compile a validated configuration into a runnable server.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let table = RouteTable::from_config(&config.routes)
            .map_err(|error| config_error("routes", error.to_string()))?;

        let cors = CorsPolicy::from_config(&config.cors)
            .map_err(|error| config_error("cors", error.to_string()))?;

        let policy = AuthorizationPolicy::from_config(&config.authorization.rules)
            .map_err(|error| config_error("authorization.rules", error.to_string()))?;

        let mut issuers = Vec::with_capacity(config.auth.issuers.len());
        for issuer in &config.auth.issuers {
            issuers.push(
                TrustedIssuer::from_config(issuer)
                    .map_err(|error| config_error("auth.issuers", error.to_string()))?,
            );
        }
        let provider =
            HttpKeyProvider::new(Duration::from_secs(config.auth.key_fetch_timeout_secs))
                .map_err(|error| config_error("auth", error.to_string()))?;
        let verifier = TokenVerifier::new(
            issuers,
            Arc::new(provider),
            Duration::from_secs(config.auth.leeway_secs),
            Duration::from_secs(config.auth.key_refresh_secs),
        );

        // Initialize HTTP Client
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            table: Arc::new(table),
            client,
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        };
        let auth = AuthState {
            policy: Arc::new(policy),
            verifier: Arc::new(verifier),
        };

        let router = Self::build_router(&config, state, auth, Arc::new(cors));
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers wrap bottom-up: the last `.layer(...)` added runs first.
    /// Per request the order is trace → request id → CORS
    /// (short-circuits OPTIONS) → request timeout → authorization →
    /// handler, so every response, 401s and timeouts included, passes
    /// back out through the CORS stage.
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        auth: AuthState,
        cors: Arc<CorsPolicy>,
    ) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(from_fn_with_state(auth, authorize_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(from_fn_with_state(cors, cors_middleware))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        // Serve with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn config_error(field: &str, message: String) -> ConfigError {
    ConfigError::Validation(vec![ValidationError {
        field: field.to_string(),
        message,
    }])
}

/// Main proxy handler.
/// Looks up the route, applies its filters, and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let method_str = method.to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    let target = match state.table.resolve(&method, &path) {
        Some(target) => target,
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(&method_str, 404, "none", start_time);
            return GatewayError::NoMatchingRoute.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        route = %target.route_id,
        forwarded_path = %target.path,
        "Route matched"
    );

    match forward(
        &state.client,
        &target,
        request,
        &request_id,
        state.upstream_timeout,
    )
    .await
    {
        Ok(response) => {
            metrics::record_request(
                &method_str,
                response.status().as_u16(),
                &target.route_id,
                start_time,
            );
            response
        }
        Err(error) => {
            let response = error.into_response();
            metrics::record_request(
                &method_str,
                response.status().as_u16(),
                &target.route_id,
                start_time,
            );
            response
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
