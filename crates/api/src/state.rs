use std::sync::Arc;

use keygate_db::stores::{RevocationStore, UserDirectory};

use crate::auth::jwt::{JwtConfig, TokenCodec};
use crate::auth::password::CredentialHasher;
use crate::auth::verifier::TokenVerifier;
use crate::config::ServerConfig;
use crate::middleware::auth::AuthGate;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Built once at startup; every field is immutable and cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Credential and profile records.
    pub users: Arc<dyn UserDirectory>,
    /// Revoked token strings.
    pub revocations: Arc<dyn RevocationStore>,
    /// Password hashing.
    pub hasher: Arc<CredentialHasher>,
    /// Token issuance (holds the signing secret).
    pub tokens: Arc<TokenCodec>,
    /// Request authorization.
    pub gate: Arc<AuthGate>,
}

impl AppState {
    /// Wire the auth components around the given stores.
    ///
    /// The signing secret is moved into the [`TokenCodec`]; the shared
    /// `config` keeps only the token lifetime.
    pub fn new(
        mut config: ServerConfig,
        users: Arc<dyn UserDirectory>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        let signing = JwtConfig {
            secret: std::mem::take(&mut config.jwt.secret),
            expiry_mins: config.jwt.expiry_mins,
        };
        let tokens = Arc::new(TokenCodec::new(&signing));
        let verifier = TokenVerifier::new(Arc::clone(&tokens), Arc::clone(&revocations));
        let gate = Arc::new(AuthGate::new(verifier, Arc::clone(&users)));

        Self {
            config: Arc::new(config),
            users,
            revocations,
            hasher: Arc::new(CredentialHasher::new()),
            tokens,
            gate,
        }
    }
}
