//! Token usability decision: cryptographic validity plus revocation state.

use std::fmt;
use std::sync::Arc;

use keygate_core::types::{parse_subject, DbId};
use keygate_db::stores::RevocationStore;

use super::jwt::{Claims, TokenCodec, TokenError};

/// Why a presented token is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidSignature,
    Expired,
    Malformed,
    Revoked,
    /// The revocation store could not answer; the token is refused.
    StoreUnavailable,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::InvalidSignature => "invalid signature",
            Rejection::Expired => "expired",
            Rejection::Malformed => "malformed",
            Rejection::Revoked => "revoked",
            Rejection::StoreUnavailable => "revocation store unavailable",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TokenError> for Rejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => Rejection::InvalidSignature,
            TokenError::Expired => Rejection::Expired,
            TokenError::Malformed | TokenError::Signing => Rejection::Malformed,
        }
    }
}

/// A token that passed every check, with its subject already parsed.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub subject: DbId,
    pub claims: Claims,
}

/// Composes [`TokenCodec`] and a [`RevocationStore`].
#[derive(Clone)]
pub struct TokenVerifier {
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenVerifier {
    pub fn new(codec: Arc<TokenCodec>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { codec, revocations }
    }

    /// Decide whether `token` is currently usable.
    ///
    /// Checks run in order and stop at the first failure: signature and
    /// expiry, then revocation, then the subject claim. The store is never
    /// queried for a token that fails the cryptographic check.
    pub async fn resolve(&self, token: &str) -> Result<VerifiedToken, Rejection> {
        let claims = self.codec.verify(token)?;

        match self.revocations.contains(token).await {
            Ok(false) => {}
            Ok(true) => return Err(Rejection::Revoked),
            Err(e) => {
                tracing::error!(error = %e, "Revocation lookup failed");
                return Err(Rejection::StoreUnavailable);
            }
        }

        let subject = parse_subject(&claims.sub).ok_or(Rejection::Malformed)?;
        Ok(VerifiedToken { subject, claims })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use keygate_core::error::CoreError;
    use keygate_core::types::Timestamp;
    use keygate_db::stores::InMemoryRevocationStore;
    use serde_json::Map;

    use super::*;
    use crate::auth::jwt::JwtConfig;

    /// Counts lookups and optionally fails them.
    #[derive(Default)]
    struct ProbeStore {
        lookups: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RevocationStore for ProbeStore {
        async fn add(&self, _token: &str, _expires_at: Timestamp) -> Result<(), CoreError> {
            Ok(())
        }

        async fn contains(&self, _token: &str) -> Result<bool, CoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CoreError::Internal("connection refused".into()));
            }
            Ok(false)
        }

        async fn prune_expired(&self, _now: Timestamp) -> Result<u64, CoreError> {
            Ok(0)
        }
    }

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&JwtConfig::new("verifier-test-secret")))
    }

    fn day() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    #[tokio::test]
    async fn fresh_token_resolves_to_subject() {
        let codec = codec();
        let verifier = TokenVerifier::new(codec.clone(), Arc::new(InMemoryRevocationStore::new()));
        let token = codec.issue("1", Map::new(), day()).unwrap();

        let verified = verifier.resolve(&token).await.unwrap();
        assert_eq!(verified.subject, 1);
        assert_eq!(verified.claims.sub, "1");
    }

    #[tokio::test]
    async fn zero_ttl_resolves_to_expired() {
        let codec = codec();
        let verifier = TokenVerifier::new(codec.clone(), Arc::new(InMemoryRevocationStore::new()));
        let token = codec.issue("1", Map::new(), Duration::ZERO).unwrap();

        assert_eq!(verifier.resolve(&token).await.unwrap_err(), Rejection::Expired);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_while_still_signed() {
        let codec = codec();
        let store = Arc::new(InMemoryRevocationStore::new());
        let verifier = TokenVerifier::new(codec.clone(), store.clone());
        let token = codec.issue("1", Map::new(), day()).unwrap();

        store
            .add(&token, Utc::now() + chrono::Duration::days(1))
            .await
            .unwrap();
        store
            .add(&token, Utc::now() + chrono::Duration::days(1))
            .await
            .unwrap();

        assert!(codec.verify(&token).is_ok(), "signature and expiry still valid");
        assert_eq!(verifier.resolve(&token).await.unwrap_err(), Rejection::Revoked);
    }

    #[tokio::test]
    async fn revocation_is_per_token_string() {
        let codec = codec();
        let store = Arc::new(InMemoryRevocationStore::new());
        let verifier = TokenVerifier::new(codec.clone(), store.clone());
        let first = codec.issue("1", Map::new(), day()).unwrap();
        let second = codec.issue("1", Map::new(), day()).unwrap();

        store
            .add(&first, Utc::now() + chrono::Duration::days(1))
            .await
            .unwrap();

        assert_eq!(verifier.resolve(&first).await.unwrap_err(), Rejection::Revoked);
        assert_eq!(verifier.resolve(&second).await.unwrap().subject, 1);
    }

    #[tokio::test]
    async fn invalid_tokens_skip_the_store() {
        let codec = codec();
        let store = Arc::new(ProbeStore::default());
        let verifier = TokenVerifier::new(codec.clone(), store.clone());

        let expired = codec.issue("1", Map::new(), Duration::ZERO).unwrap();
        let foreign = TokenCodec::new(&JwtConfig::new("other"))
            .issue("1", Map::new(), day())
            .unwrap();

        assert_eq!(verifier.resolve(&expired).await.unwrap_err(), Rejection::Expired);
        assert_eq!(
            verifier.resolve(&foreign).await.unwrap_err(),
            Rejection::InvalidSignature
        );
        assert_eq!(verifier.resolve("junk").await.unwrap_err(), Rejection::Malformed);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_subject_is_malformed() {
        let codec = codec();
        let verifier = TokenVerifier::new(codec.clone(), Arc::new(InMemoryRevocationStore::new()));
        let token = codec.issue("", Map::new(), day()).unwrap();

        assert_eq!(verifier.resolve(&token).await.unwrap_err(), Rejection::Malformed);
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let codec = codec();
        let store = Arc::new(ProbeStore {
            fail: true,
            ..Default::default()
        });
        let verifier = TokenVerifier::new(codec.clone(), store);
        let token = codec.issue("1", Map::new(), day()).unwrap();

        assert_eq!(
            verifier.resolve(&token).await.unwrap_err(),
            Rejection::StoreUnavailable
        );
    }
}
