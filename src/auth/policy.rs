//! Per-route authorization policy.
//!
//! # Responsibilities
//! - Map (method, path) to the trust level a request must carry
//! - Rank overlapping rules so the most specific one decides
//!
//! # Design Decisions
//! - OPTIONS is always public. Preflight negotiation happens before
//!   authorization and must never be blocked by it
//! - Unmatched paths default to public. New protected resources need
//!   an explicit rule; the fallthrough is logged at debug level
//! - Specificity outranks declaration order; declaration order only
//!   breaks ties within a specificity class

use axum::http::Method;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{AccessConfig, AuthorizationRuleConfig};
use crate::routing::matcher::PatternError;
use crate::routing::PathPattern;

/// Trust level a request must present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("invalid rule method '{0}'")]
    Method(String),
}

/// One (method, pattern) to trust level mapping.
#[derive(Debug)]
pub struct AuthorizationRule {
    method: Option<Method>,
    pattern: PathPattern,
    access: Access,
}

impl AuthorizationRule {
    fn applies(&self, method: &Method, path: &str) -> bool {
        if let Some(required) = &self.method {
            if required != method {
                return false;
            }
        }
        self.pattern.matches(path)
    }

    /// Lower ranks decide first. Exact patterns outrank wildcard
    /// patterns; a method constraint outranks a wildcard method.
    fn specificity(&self) -> u8 {
        match (self.method.is_some(), self.pattern.is_exact()) {
            (true, true) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        }
    }
}

/// Immutable rule set, evaluated most-specific-first.
pub struct AuthorizationPolicy {
    rules: Vec<AuthorizationRule>,
}

impl AuthorizationPolicy {
    pub fn new(rules: Vec<AuthorizationRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(rules: &[AuthorizationRuleConfig]) -> Result<Self, PolicyError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let method = match rule.method.as_deref() {
                Some(raw) => Some(
                    Method::from_str(&raw.to_uppercase())
                        .map_err(|_| PolicyError::Method(raw.to_string()))?,
                ),
                None => None,
            };
            compiled.push(AuthorizationRule {
                method,
                pattern: PathPattern::parse(&rule.path)?,
                access: match rule.access {
                    AccessConfig::Public => Access::Public,
                    AccessConfig::Authenticated => Access::Authenticated,
                },
            });
        }
        Ok(Self::new(compiled))
    }

    /// Trust level required for this request.
    pub fn decide(&self, method: &Method, path: &str) -> Access {
        if method == Method::OPTIONS {
            return Access::Public;
        }

        let mut best: Option<(u8, Access)> = None;
        for rule in &self.rules {
            if !rule.applies(method, path) {
                continue;
            }
            let rank = rule.specificity();
            match best {
                // Earlier rule at the same rank keeps the decision.
                Some((held, _)) if held <= rank => {}
                _ => best = Some((rank, rule.access)),
            }
        }

        match best {
            Some((_, access)) => access,
            None => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    "No authorization rule matched, treating as public"
                );
                Access::Public
            }
        }
    }
}
