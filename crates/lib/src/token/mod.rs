//! Bearer token issuance and verification
//!
//! Issues compact HMAC-SHA256 signed tokens (JWT wire format) carrying a
//! typed claims structure of principal identity and absolute expiry. Both
//! claims are required at parse time; a token missing either is rejected
//! outright rather than failing later.
//!
//! Verification is stateless: validity is determined purely by signature and
//! expiry. There is no revocation list; once issued, a token stays valid
//! until its absolute expiry.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::Result;

pub mod errors;
pub use errors::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default token lifetime: 15 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// The only signing algorithm this service accepts. Asymmetric and "none"
/// algorithms are rejected to block algorithm-confusion attacks.
const EXPECTED_ALG: &str = "HS256";

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Typed token claims. Both fields are required; deserialization of a token
/// missing either fails.
#[derive(Serialize, Deserialize)]
struct Claims {
    /// Principal identity (username).
    sub: String,
    /// Absolute expiry as Unix seconds.
    exp: i64,
}

/// Issues and verifies signed bearer tokens.
///
/// Holds one immutable signing key for the process lifetime; read-only after
/// construction and safe for unsynchronized concurrent use.
pub struct TokenService {
    signing_key: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from a signing secret.
    ///
    /// The secret must be at least 32 bytes and must come from process
    /// configuration, never from user input.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self> {
        let signing_key = secret.into();
        if signing_key.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::SecretTooShort {
                actual: signing_key.len(),
                minimum: MIN_SECRET_LENGTH,
            }
            .into());
        }
        Ok(Self {
            signing_key,
            ttl: DEFAULT_TTL,
        })
    }

    /// Override the token lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a token asserting the given principal identity, expiring
    /// `ttl` from now.
    pub fn issue(&self, principal: impl Into<String>) -> Result<String> {
        let claims = Claims {
            sub: principal.into(),
            exp: chrono::Utc::now().timestamp() + self.ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let header = Header {
            alg: EXPECTED_ALG.to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
        let claims_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);

        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = HmacSha256::new_from_slice(&self.signing_key).map_err(|e| {
            TokenError::SigningFailed {
                reason: e.to_string(),
            }
        })?;
        mac.update(signing_input.as_bytes());
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&tag)
        ))
    }

    /// Verify a token and return the principal identity it asserts.
    ///
    /// Rejects on: wrong or missing algorithm, invalid signature
    /// (constant-time MAC comparison), elapsed expiry, or missing/malformed
    /// claims. No external lookup is performed.
    pub fn verify(&self, token: &str) -> Result<String> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(tag_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::MalformedToken.into());
        };

        let header_bytes = Base64UrlUnpadded::decode_vec(header_b64)
            .map_err(|_| TokenError::MalformedToken)?;
        let header: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::MalformedToken)?;
        if header.alg != EXPECTED_ALG {
            return Err(TokenError::UnexpectedAlgorithm { alg: header.alg }.into());
        }

        // Authenticate before trusting any claim content.
        let tag =
            Base64UrlUnpadded::decode_vec(tag_b64).map_err(|_| TokenError::MalformedToken)?;
        let mut mac = HmacSha256::new_from_slice(&self.signing_key).map_err(|e| {
            TokenError::SigningFailed {
                reason: e.to_string(),
            }
        })?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims_bytes = Base64UrlUnpadded::decode_vec(claims_b64)
            .map_err(|_| TokenError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::MalformedClaims)?;
        if claims.sub.is_empty() {
            return Err(TokenError::MalformedClaims.into());
        }
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(TokenError::Expired.into());
        }

        Ok(claims.sub)
    }
}

/// Extract the bearer token from an `Authorization: Bearer <token>` header.
///
/// Absence or a malformed prefix is an authentication failure, not a parse
/// error.
pub fn extract_bearer(headers: &axum::http::HeaderMap) -> Result<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| TokenError::MissingAuth.into())
}
