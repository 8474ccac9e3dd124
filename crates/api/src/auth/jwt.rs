//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying a [`Claims`] payload. The signature covers
//! the whole payload, so no field (expiry included) can be altered without
//! invalidating it.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Default token lifetime in minutes (24 hours).
const DEFAULT_EXPIRY_MINS: i64 = 24 * 60;

/// Longest accepted token lifetime in minutes (one year).
pub const MAX_EXPIRY_MINS: i64 = 365 * 24 * 60;

/// Claim names owned by the codec; caller-supplied claims may not shadow them.
const RESERVED_CLAIMS: [&str; 4] = ["sub", "iat", "exp", "jti"];

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject -- the user's directory id, as a string.
    pub sub: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4). Two tokens issued in the same
    /// second for the same subject still differ.
    pub jti: String,
    /// Caller-supplied claims, flattened into the payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Expiry as a UTC timestamp, if representable.
    pub fn expires_at(&self) -> Option<chrono::DateTime<Utc>> {
        chrono::DateTime::from_timestamp(self.exp, 0)
    }
}

/// Why a token failed cryptographic verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    /// The signing primitive itself failed while issuing.
    #[error("token signing failed")]
    Signing,
}

/// Configuration for token issuance and verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in minutes (default: 1440).
    pub expiry_mins: i64,
}

impl JwtConfig {
    /// Build a config with the default lifetime.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry_mins: DEFAULT_EXPIRY_MINS,
        }
    }

    /// Lifetime applied to tokens issued at sign-up and sign-in.
    ///
    /// Out-of-range values saturate rather than overflow; `from_env` rejects
    /// them before they get here.
    pub fn ttl(&self) -> Duration {
        let mins = self.expiry_mins.clamp(0, MAX_EXPIRY_MINS) as u64;
        Duration::from_secs(mins.saturating_mul(60))
    }
}

/// Issues and verifies signed tokens with a process-wide secret.
///
/// The secret is captured at construction; nothing else in the crate reads it.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand so that `now == exp` already counts as
        // expired, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        // `aud`, `iss` and `nbf` are ordinary caller claims here, not policy.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `subject` that expires `ttl` from now.
    ///
    /// Entries of `extra` named like a reserved claim are dropped.
    pub fn issue(
        &self,
        subject: &str,
        mut extra: Map<String, Value>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        extra.retain(|key, _| !RESERVED_CLAIMS.contains(&key.as_str()));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl.as_secs().min(i64::MAX as u64) as i64),
            jti: Uuid::new_v4().to_string(),
            extra,
        };
        self.sign(&claims)
    }

    /// Sign an already-built claims set.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            TokenError::Signing
        })
    }

    /// Verify the signature and expiry of `token`, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| classify(e.kind()))?;
        if Utc::now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
