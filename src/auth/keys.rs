//! Issuer key resolution.
//!
//! # Responsibilities
//! - Fetch the JWK set each trusted issuer publishes
//! - Memoize per issuer with a bounded refresh interval
//! - Collapse concurrent fetches for one issuer into a single request
//!
//! # Design Decisions
//! - Fetch failures are transient: a previously fetched set keeps
//!   serving and the next call retries; an issuer is never blacklisted
//! - The trusted issuer set is fixed at startup; entries are created
//!   once and never added or removed at runtime

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::config::IssuerConfig;

/// A trusted token issuer and its key publication endpoint.
#[derive(Debug, Clone)]
pub struct TrustedIssuer {
    pub issuer: String,
    pub jwks_url: Url,
}

impl TrustedIssuer {
    pub fn from_config(config: &IssuerConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            issuer: config.issuer.clone(),
            jwks_url: Url::parse(&config.jwks_url)?,
        })
    }
}

/// Key resolution failure. Always transient from the caller's view.
#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("key endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("key endpoint returned status {0}")]
    Status(u16),
    #[error("no key source registered for issuer '{0}'")]
    UnknownIssuer(String),
    #[error("issuer published no key usable for this credential")]
    NoUsableKey,
    #[error("published key is unusable: {0}")]
    Jwk(#[from] jsonwebtoken::errors::Error),
}

/// Source of issuer key material.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Fetch the JWK set currently published at `url`.
    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyFetchError>;
}

/// Fetches JWK sets over HTTP with a hard per-request timeout.
pub struct HttpKeyProvider {
    client: reqwest::Client,
}

impl HttpKeyProvider {
    pub fn new(timeout: Duration) -> Result<Self, KeyFetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl KeyProvider for HttpKeyProvider {
    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyFetchError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }
        Ok(response.json::<JwkSet>().await?)
    }
}

/// Serves fixed JWK sets from memory.
pub struct StaticKeyProvider {
    sets: HashMap<Url, JwkSet>,
}

impl StaticKeyProvider {
    pub fn new(sets: HashMap<Url, JwkSet>) -> Self {
        Self { sets }
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn fetch(&self, url: &Url) -> Result<JwkSet, KeyFetchError> {
        self.sets
            .get(url)
            .cloned()
            .ok_or(KeyFetchError::Status(404))
    }
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

struct IssuerEntry {
    jwks_url: Url,
    keys: Mutex<Option<CachedKeys>>,
}

/// Per-issuer memoized key sets.
pub struct KeyCache {
    provider: Arc<dyn KeyProvider>,
    refresh: Duration,
    entries: HashMap<String, IssuerEntry>,
}

impl KeyCache {
    pub fn new(provider: Arc<dyn KeyProvider>, issuers: &[TrustedIssuer], refresh: Duration) -> Self {
        let entries = issuers
            .iter()
            .map(|issuer| {
                (
                    issuer.issuer.clone(),
                    IssuerEntry {
                        jwks_url: issuer.jwks_url.clone(),
                        keys: Mutex::new(None),
                    },
                )
            })
            .collect();
        Self {
            provider,
            refresh,
            entries,
        }
    }

    /// The current JWK set for `issuer`.
    ///
    /// The per-issuer lock is held across the fetch, so concurrent
    /// callers for an unresolved issuer queue on one in-flight request
    /// instead of stampeding the endpoint.
    pub async fn jwk_set(&self, issuer: &str) -> Result<JwkSet, KeyFetchError> {
        let entry = self
            .entries
            .get(issuer)
            .ok_or_else(|| KeyFetchError::UnknownIssuer(issuer.to_string()))?;

        let mut guard = entry.keys.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < self.refresh {
                return Ok(cached.set.clone());
            }
        }

        match self.provider.fetch(&entry.jwks_url).await {
            Ok(set) => {
                *guard = Some(CachedKeys {
                    set: set.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(set)
            }
            Err(error) => match guard.as_ref() {
                Some(stale) => {
                    tracing::warn!(
                        issuer = %issuer,
                        error = %error,
                        "Key refresh failed, serving previous key set"
                    );
                    Ok(stale.set.clone())
                }
                None => Err(error),
            },
        }
    }
}
