//! Structural credential decoding.
//!
//! Decodes the JOSE header and the claim segment of a bearer token
//! without touching key material, so temporal and issuer checks can run
//! before any key resolution.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::Header;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Structural decode failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not a three-segment JWS")]
    Malformed,
    #[error("claim segment is not valid base64url")]
    Base64,
    #[error("claim segment is not a JSON object")]
    Json,
    #[error("unreadable JOSE header: {0}")]
    Header(#[from] jsonwebtoken::errors::Error),
}

/// Registered claims the gateway inspects, plus everything else verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimSet {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub nbf: Option<i64>,
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A structurally decoded token. Nothing about it is verified yet.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: Header,
    pub claims: ClaimSet,
    pub raw: String,
}

impl DecodedToken {
    /// Decode the header and claim segments of `token`.
    pub fn decode(token: &str) -> Result<Self, DecodeError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(DecodeError::Malformed);
        }

        let header = jsonwebtoken::decode_header(token)?;
        let payload = URL_SAFE_NO_PAD
            .decode(segments[1])
            .map_err(|_| DecodeError::Base64)?;
        let claims: ClaimSet = serde_json::from_slice(&payload).map_err(|_| DecodeError::Json)?;

        Ok(Self {
            header,
            claims,
            raw: token.to_string(),
        })
    }
}
