//! Route filters applied to the forwarded request.
//!
//! # Design Decisions
//! - Filters are a closed enum; adding one is a code change, not a plugin
//! - Applied in declaration order; each sees the previous filter's output
//! - A rewrite that matches nothing passes the path through unchanged

use axum::http::{HeaderName, HeaderValue};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

use crate::config::FilterConfig;
use crate::routing::path;

/// Filter compilation failure.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid rewrite pattern: {0}")]
    InvalidRewritePattern(#[from] regex::Error),
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
    #[error("invalid header value for '{0}'")]
    InvalidHeaderValue(String),
}

/// A compiled request filter.
#[derive(Debug, Clone)]
pub enum RouteFilter {
    /// Remove the first N segments of the path.
    StripPrefix(usize),
    /// Rewrite the path via regex with named capture groups.
    RewritePath { pattern: Regex, replacement: String },
    /// Inject a fixed header into the outbound request.
    SetRequestHeader { name: HeaderName, value: HeaderValue },
}

impl RouteFilter {
    /// Compile a filter from its configuration.
    pub fn from_config(config: &FilterConfig) -> Result<Self, FilterError> {
        match config {
            FilterConfig::StripPrefix { parts } => Ok(RouteFilter::StripPrefix(*parts)),
            FilterConfig::RewritePath {
                pattern,
                replacement,
            } => Ok(RouteFilter::RewritePath {
                pattern: Regex::new(pattern)?,
                replacement: replacement.clone(),
            }),
            FilterConfig::SetRequestHeader { name, value } => Ok(RouteFilter::SetRequestHeader {
                name: HeaderName::from_str(name)
                    .map_err(|_| FilterError::InvalidHeaderName(name.clone()))?,
                value: HeaderValue::from_str(value)
                    .map_err(|_| FilterError::InvalidHeaderValue(name.clone()))?,
            }),
        }
    }

    /// Apply this filter, returning the (possibly) transformed path.
    /// Header filters push onto `headers` and leave the path alone.
    pub fn apply(&self, path: String, headers: &mut Vec<(HeaderName, HeaderValue)>) -> String {
        match self {
            RouteFilter::StripPrefix(parts) => path::strip_prefix(&path, *parts),
            RouteFilter::RewritePath {
                pattern,
                replacement,
            } => path::rewrite_path(pattern, replacement, &path),
            RouteFilter::SetRequestHeader { name, value } => {
                headers.push((name.clone(), value.clone()));
                path
            }
        }
    }
}
