//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate route ids and issuers
//! - Reject a cross-origin policy that can never be valid
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::{HeaderName, HeaderValue, Method, Uri};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::config::schema::{FilterConfig, GatewayConfig};
use crate::routing::matcher::PathPattern;

/// A single semantic problem found in a configuration.
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(err("timeouts.upstream_secs", "must be greater than zero"));
    }

    validate_cors(config, &mut errors);
    validate_auth(config, &mut errors);
    validate_rules(config, &mut errors);
    validate_routes(config, &mut errors);

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_cors(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let cors = &config.cors;
    if cors.allow_origin.is_empty() {
        errors.push(err("cors.allow_origin", "must not be empty"));
    }
    if cors.allow_origin == "*" && cors.allow_credentials {
        errors.push(err(
            "cors.allow_origin",
            "wildcard origin cannot be combined with allow_credentials",
        ));
    }
    for (field, value) in [
        ("cors.allow_origin", cors.allow_origin.clone()),
        ("cors.allow_methods", cors.allow_methods.join(", ")),
        ("cors.allow_headers", cors.allow_headers.join(", ")),
        ("cors.expose_headers", cors.expose_headers.join(", ")),
    ] {
        if !value.is_empty() && HeaderValue::from_str(&value).is_err() {
            errors.push(err(field, format!("'{}' is not a valid header value", value)));
        }
    }
}

fn validate_auth(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let auth = &config.auth;
    if auth.issuers.is_empty() {
        errors.push(err("auth.issuers", "at least one trusted issuer is required"));
    }
    let mut seen = HashSet::new();
    for issuer in &auth.issuers {
        if !seen.insert(issuer.issuer.as_str()) {
            errors.push(err(
                "auth.issuers",
                format!("issuer '{}' is declared twice", issuer.issuer),
            ));
        }
        match url::Url::parse(&issuer.jwks_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => errors.push(err(
                "auth.issuers",
                format!(
                    "jwks_url '{}' for issuer '{}' is not an http(s) URL",
                    issuer.jwks_url, issuer.issuer
                ),
            )),
        }
    }
    if auth.key_refresh_secs == 0 {
        errors.push(err("auth.key_refresh_secs", "must be greater than zero"));
    }
    if auth.key_fetch_timeout_secs == 0 {
        errors.push(err("auth.key_fetch_timeout_secs", "must be greater than zero"));
    }
}

fn validate_rules(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    for (index, rule) in config.authorization.rules.iter().enumerate() {
        let field = format!("authorization.rules[{}]", index);
        if let Err(error) = PathPattern::parse(&rule.path) {
            errors.push(err(&field, format!("pattern '{}': {}", rule.path, error)));
        }
        if let Some(method) = &rule.method {
            if Method::from_str(&method.to_uppercase()).is_err() {
                errors.push(err(&field, format!("'{}' is not an HTTP method", method)));
            }
        }
    }
}

fn validate_routes(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for route in &config.routes {
        let field = |name: &str| format!("routes.{}.{}", route.id, name);

        if route.id.is_empty() {
            errors.push(err("routes", "route id must not be empty"));
        }
        if !seen.insert(route.id.as_str()) {
            errors.push(err("routes", format!("route id '{}' is declared twice", route.id)));
        }

        if route.paths.is_empty() {
            errors.push(err(field("paths"), "at least one path pattern is required"));
        }
        for path in &route.paths {
            if let Err(error) = PathPattern::parse(path) {
                errors.push(err(field("paths"), format!("pattern '{}': {}", path, error)));
            }
        }

        if let Some(method) = &route.method {
            if Method::from_str(&method.to_uppercase()).is_err() {
                errors.push(err(field("method"), format!("'{}' is not an HTTP method", method)));
            }
        }

        for filter in &route.filters {
            match filter {
                FilterConfig::StripPrefix { .. } => {}
                FilterConfig::RewritePath { pattern, .. } => {
                    if let Err(error) = regex::Regex::new(pattern) {
                        errors.push(err(
                            field("filters"),
                            format!("rewrite pattern '{}' does not compile: {}", pattern, error),
                        ));
                    }
                }
                FilterConfig::SetRequestHeader { name, value } => {
                    if HeaderName::from_str(name).is_err() {
                        errors.push(err(
                            field("filters"),
                            format!("'{}' is not a valid header name", name),
                        ));
                    }
                    if HeaderValue::from_str(value).is_err() {
                        errors.push(err(
                            field("filters"),
                            format!("'{}' is not a valid header value", value),
                        ));
                    }
                }
            }
        }

        match Uri::from_str(&route.upstream) {
            Ok(uri) if uri.scheme().is_some() && uri.authority().is_some() => {}
            _ => errors.push(err(
                field("upstream"),
                format!("'{}' is not an absolute URI", route.upstream),
            )),
        }
    }
}
