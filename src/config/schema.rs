//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Authorization rules evaluated ahead of routing.
    pub authorization: AuthorizationConfig,

    /// Route definitions mapping requests to upstream services.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for a single upstream call in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Cross-origin policy configuration.
///
/// A wildcard `allow_origin` combined with `allow_credentials = true`
/// is rejected at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// The single allowed origin.
    pub allow_origin: String,

    /// Methods offered during preflight negotiation.
    pub allow_methods: Vec<String>,

    /// Request headers offered during preflight negotiation.
    pub allow_headers: Vec<String>,

    /// Response headers the browser may read.
    pub expose_headers: Vec<String>,

    /// Whether credentialed requests are permitted.
    pub allow_credentials: bool,

    /// How long browsers may cache a preflight answer, in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "http://localhost:5173".to_string(),
            allow_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_headers: vec!["*".to_string()],
            expose_headers: vec!["Authorization".to_string()],
            allow_credentials: true,
            max_age_secs: 3600,
        }
    }
}

/// Credential verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Trusted token issuers. A credential must name exactly one of
    /// these in its issuer claim.
    pub issuers: Vec<IssuerConfig>,

    /// Clock skew tolerance for temporal claims, in seconds.
    pub leeway_secs: u64,

    /// How long fetched issuer keys stay fresh, in seconds.
    pub key_refresh_secs: u64,

    /// Timeout for one key-endpoint request, in seconds.
    pub key_fetch_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuers: vec![
                IssuerConfig {
                    issuer: "http://keycloak-sso:8080/realms/videoclub".to_string(),
                    jwks_url: "http://keycloak-sso:8080/realms/videoclub/protocol/openid-connect/certs".to_string(),
                },
                IssuerConfig {
                    issuer: "http://localhost:9090/realms/videoclub".to_string(),
                    jwks_url: "http://localhost:9090/realms/videoclub/protocol/openid-connect/certs".to_string(),
                },
            ],
            leeway_secs: 60,
            key_refresh_secs: 300,
            key_fetch_timeout_secs: 5,
        }
    }
}

/// One trusted issuer and the endpoint publishing its signing keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuerConfig {
    /// Issuer identifier, matched exactly against the issuer claim.
    pub issuer: String,

    /// JWKS endpoint URL for this issuer.
    pub jwks_url: String,
}

/// Authorization rule set.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Rules mapping (method, path pattern) to a required trust level.
    pub rules: Vec<AuthorizationRuleConfig>,
}

/// One authorization rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorizationRuleConfig {
    /// HTTP method constraint; absent means any method.
    pub method: Option<String>,

    /// Path pattern (`**` and `*` wildcards supported).
    pub path: String,

    /// Trust level required when this rule decides.
    pub access: AccessConfig,
}

/// Trust level named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessConfig {
    Public,
    Authenticated,
}

/// Route configuration mapping requests to an upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Unique within the table.
    pub id: String,

    /// HTTP method constraint; absent means any method.
    #[serde(default)]
    pub method: Option<String>,

    /// Path patterns; the route matches if any pattern matches.
    pub paths: Vec<String>,

    /// Filters applied in declaration order to the forwarded request.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    /// Upstream target URI (scheme and authority required).
    pub upstream: String,
}

/// A single route filter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Drop the first `parts` path segments before forwarding.
    StripPrefix { parts: usize },

    /// Rewrite the path with a regex; named capture groups may appear
    /// in the replacement. A non-matching pattern leaves the path
    /// unchanged.
    RewritePath { pattern: String, replacement: String },

    /// Inject a header into the forwarded request.
    SetRequestHeader { name: String, value: String },
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
