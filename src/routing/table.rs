//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Compile validated route configuration into an immutable table
//! - Find the first route whose predicates accept a request
//! - Produce the forward target: transformed path plus injected headers
//!
//! # Design Decisions
//! - Evaluation order is declaration order; the first match wins
//! - There is no priority field and no scoring
//! - No match is an explicit outcome, never a silent default

use axum::http::{HeaderName, HeaderValue, Method, Uri};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::filter::{FilterError, RouteFilter};
use crate::routing::matcher::{PathPattern, PatternError};

/// Route table compilation failure.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route '{route}': {source}")]
    Pattern {
        route: String,
        #[source]
        source: PatternError,
    },
    #[error("route '{route}': {source}")]
    Filter {
        route: String,
        #[source]
        source: FilterError,
    },
    #[error("route '{route}': invalid method '{method}'")]
    Method { route: String, method: String },
    #[error("route '{route}': upstream '{upstream}' is not an absolute URI")]
    Upstream { route: String, upstream: String },
    #[error("duplicate route id '{0}'")]
    DuplicateId(String),
}

/// A single compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub method: Option<Method>,
    pub patterns: Vec<PathPattern>,
    pub filters: Vec<RouteFilter>,
    pub upstream: Uri,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(constraint) = &self.method {
            if constraint != method {
                return false;
            }
        }
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Apply this route's filters to `path` in declaration order.
    fn forward_target(&self, path: &str) -> ForwardTarget {
        let mut headers = Vec::new();
        let mut transformed = path.to_string();
        for filter in &self.filters {
            transformed = filter.apply(transformed, &mut headers);
        }
        ForwardTarget {
            route_id: self.id.clone(),
            upstream: self.upstream.clone(),
            path: transformed,
            headers,
        }
    }
}

/// Where and how a matched request is forwarded.
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    pub route_id: String,
    pub upstream: Uri,
    pub path: String,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

/// Ordered, immutable route table.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile routes from configuration, preserving declaration order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(configs.len());
        for config in configs {
            if !seen.insert(config.id.clone()) {
                return Err(RouteError::DuplicateId(config.id.clone()));
            }
            routes.push(compile_route(config)?);
        }
        Ok(Self { routes })
    }

    /// First route whose predicates accept the request, if any.
    pub fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(method, path))
    }

    /// The full routing decision: match, then transform.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ForwardTarget> {
        self.find(method, path).map(|r| r.forward_target(path))
    }

    /// Routes in evaluation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn compile_route(config: &RouteConfig) -> Result<Route, RouteError> {
    let method = match &config.method {
        Some(m) => Some(
            Method::from_str(&m.to_uppercase()).map_err(|_| RouteError::Method {
                route: config.id.clone(),
                method: m.clone(),
            })?,
        ),
        None => None,
    };

    let mut patterns = Vec::with_capacity(config.paths.len());
    for path in &config.paths {
        patterns.push(PathPattern::parse(path).map_err(|e| RouteError::Pattern {
            route: config.id.clone(),
            source: e,
        })?);
    }

    let mut filters = Vec::with_capacity(config.filters.len());
    for filter in &config.filters {
        filters.push(RouteFilter::from_config(filter).map_err(|e| RouteError::Filter {
            route: config.id.clone(),
            source: e,
        })?);
    }

    let upstream = Uri::from_str(&config.upstream).map_err(|_| RouteError::Upstream {
        route: config.id.clone(),
        upstream: config.upstream.clone(),
    })?;
    if upstream.scheme().is_none() || upstream.authority().is_none() {
        return Err(RouteError::Upstream {
            route: config.id.clone(),
            upstream: config.upstream.clone(),
        });
    }

    Ok(Route {
        id: config.id.clone(),
        method,
        patterns,
        filters,
        upstream,
    })
}
