//! Bearer credential verification.
//!
//! # Responsibilities
//! - Decode the bearer token and validate its structure
//! - Check temporal claims against a configurable skew window
//! - Check the issuer claim against the trusted issuer set
//! - Verify the signature against the issuer's published keys
//!
//! # Design Decisions
//! - Checks run in a fixed order and stop at the first failure, so a
//!   token that is both expired and from an unknown issuer reports
//!   expiry. Each rejection carries one reason for diagnostics
//! - Issuer matching is exact string comparison, no normalization
//! - Callers see a single 401; rejection reasons stay in logs and
//!   metrics

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{DecodingKey, Validation};
use thiserror::Error;

use crate::auth::claims::{ClaimSet, DecodedToken};
use crate::auth::keys::{KeyCache, KeyFetchError, KeyProvider, TrustedIssuer};

/// Rejection reason. Every variant surfaces to the caller as 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("request carries no bearer credential")]
    MissingCredential,
    #[error("credential is malformed or its signature is invalid")]
    InvalidSignature,
    #[error("credential is expired or not yet valid")]
    ExpiredOrNotYetValid,
    #[error("untrusted issuer '{issuer}', accepted issuers: {accepted:?}")]
    UntrustedIssuer {
        issuer: String,
        accepted: Vec<String>,
    },
    #[error("signing keys could not be resolved: {0}")]
    KeyResolutionFailed(#[from] KeyFetchError),
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredOrNotYetValid => "expired_or_not_yet_valid",
            Self::UntrustedIssuer { .. } => "untrusted_issuer",
            Self::KeyResolutionFailed(_) => "key_resolution_failed",
        }
    }
}

/// A verified credential, scoped to one request.
///
/// `raw` keeps the original token string so the relay stage can attach
/// it to the upstream request unchanged.
#[derive(Debug, Clone)]
pub struct Credential {
    pub issuer: String,
    pub subject: Option<String>,
    pub issued_at: Option<i64>,
    pub not_before: Option<i64>,
    pub expires_at: i64,
    pub claims: serde_json::Map<String, serde_json::Value>,
    pub raw: String,
}

/// Verifies bearer credentials against a fixed set of trusted issuers.
pub struct TokenVerifier {
    accepted_issuers: Vec<String>,
    keys: KeyCache,
    leeway: Duration,
}

impl TokenVerifier {
    pub fn new(
        issuers: Vec<TrustedIssuer>,
        provider: Arc<dyn KeyProvider>,
        leeway: Duration,
        key_refresh: Duration,
    ) -> Self {
        let accepted_issuers = issuers.iter().map(|i| i.issuer.clone()).collect();
        let keys = KeyCache::new(provider, &issuers, key_refresh);
        Self {
            accepted_issuers,
            keys,
            leeway,
        }
    }

    /// Verify `token` and produce the request-scoped credential.
    pub async fn verify(&self, token: &str) -> Result<Credential, AuthError> {
        let decoded = DecodedToken::decode(token).map_err(|error| {
            tracing::debug!(error = %error, "Credential failed structural decode");
            AuthError::InvalidSignature
        })?;

        let expires_at = self.check_timestamps(&decoded.claims, unix_now())?;
        let issuer = self.check_issuer(&decoded.claims)?;
        let jwks = self.keys.jwk_set(&issuer).await?;
        self.check_signature(token, &decoded, &jwks)?;

        let ClaimSet {
            sub, nbf, iat, rest, ..
        } = decoded.claims;
        Ok(Credential {
            issuer,
            subject: sub,
            issued_at: iat,
            not_before: nbf,
            expires_at,
            claims: rest,
            raw: decoded.raw,
        })
    }

    /// Expiry is mandatory; `nbf` only constrains when present.
    fn check_timestamps(&self, claims: &ClaimSet, now: i64) -> Result<i64, AuthError> {
        let leeway = self.leeway.as_secs() as i64;
        let exp = claims.exp.ok_or(AuthError::ExpiredOrNotYetValid)?;
        if now >= exp + leeway {
            return Err(AuthError::ExpiredOrNotYetValid);
        }
        if let Some(nbf) = claims.nbf {
            if now < nbf - leeway {
                return Err(AuthError::ExpiredOrNotYetValid);
            }
        }
        Ok(exp)
    }

    fn check_issuer(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        let issuer = claims.iss.clone().unwrap_or_default();
        if self.accepted_issuers.iter().any(|a| a == &issuer) {
            Ok(issuer)
        } else {
            Err(AuthError::UntrustedIssuer {
                issuer,
                accepted: self.accepted_issuers.clone(),
            })
        }
    }

    /// Signature-only pass. Temporal and issuer claims were already
    /// checked above with their own rejection reasons.
    fn check_signature(
        &self,
        token: &str,
        decoded: &DecodedToken,
        jwks: &JwkSet,
    ) -> Result<(), AuthError> {
        let jwk = select_key(jwks, decoded.header.kid.as_deref())
            .ok_or(AuthError::KeyResolutionFailed(KeyFetchError::NoUsableKey))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|error| AuthError::KeyResolutionFailed(KeyFetchError::Jwk(error)))?;

        let mut validation = Validation::new(decoded.header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<serde_json::Value>(token, &key, &validation).map_err(|error| {
            tracing::debug!(error = %error, "Credential signature rejected");
            AuthError::InvalidSignature
        })?;
        Ok(())
    }
}

/// Pick the key named by the header, or the set's only sensible
/// default when the header names none.
fn select_key<'a>(jwks: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => jwks.find(kid),
        None => jwks.keys.first(),
    }
}

fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}
