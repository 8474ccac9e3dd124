//! Per-request authorization gate.
//!
//! [`AuthGate::authorize`] walks a fixed sequence of states and always ends in
//! exactly one of two outcomes:
//!
//! ```text
//! Start --no token--> Unauthorized(Missing)
//!   |
//!   v
//! Verifying --rejected--> Unauthorized(Token(reason))
//!   |
//!   v
//! ResolvingSubject --absent--> Unauthorized(SubjectMissing)
//!   |
//!   v
//! Authorized(identity)
//! ```
//!
//! The reason is logged; callers only ever see a uniform 401.

use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use keygate_core::error::CoreError;
use keygate_core::types::DbId;
use keygate_db::models::user::UserResponse;
use keygate_db::stores::UserDirectory;

use crate::auth::jwt::Claims;
use crate::auth::verifier::{Rejection, TokenVerifier};
use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie consulted when no Bearer header is present.
pub const TOKEN_COOKIE: &str = "token";

/// Message returned to callers for every unauthorized outcome.
pub const UNAUTHORIZED: &str = "Unauthorized";

/// Why the gate refused a request. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Missing,
    Token(Rejection),
    SubjectMissing,
    DirectoryUnavailable,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Missing => f.write_str("missing"),
            DenyReason::Token(rejection) => write!(f, "token {rejection}"),
            DenyReason::SubjectMissing => f.write_str("subject missing"),
            DenyReason::DirectoryUnavailable => f.write_str("directory unavailable"),
        }
    }
}

/// The authenticated caller, attached to request extensions on success.
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub user_id: DbId,
    pub user: UserResponse,
    /// The exact token string that was verified (used by logout).
    pub token: String,
    pub claims: Claims,
}

/// Terminal state of one pass through the gate.
#[derive(Debug)]
pub enum GateOutcome {
    Authorized(AuthorizedIdentity),
    Unauthorized(DenyReason),
}

/// Pull a candidate token from the request headers.
///
/// An `Authorization: Bearer <token>` header wins; otherwise the `token`
/// cookie is used. Empty values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|t| !t.is_empty())
}

/// Ties token verification to subject resolution.
#[derive(Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
    users: Arc<dyn UserDirectory>,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier, users: Arc<dyn UserDirectory>) -> Self {
        Self { verifier, users }
    }

    /// Run the gate for one request.
    pub async fn authorize(&self, headers: &HeaderMap) -> GateOutcome {
        let Some(token) = extract_token(headers) else {
            return deny(DenyReason::Missing);
        };

        let verified = match self.verifier.resolve(token).await {
            Ok(verified) => verified,
            Err(rejection) => return deny(DenyReason::Token(rejection)),
        };

        match self.users.find_by_id(verified.subject).await {
            Ok(Some(user)) => GateOutcome::Authorized(AuthorizedIdentity {
                user_id: user.id,
                user: UserResponse::from(&user),
                token: token.to_string(),
                claims: verified.claims,
            }),
            Ok(None) => {
                tracing::warn!(user_id = verified.subject, "Token subject no longer exists");
                deny(DenyReason::SubjectMissing)
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = verified.subject, "Subject lookup failed");
                deny(DenyReason::DirectoryUnavailable)
            }
        }
    }
}

fn deny(reason: DenyReason) -> GateOutcome {
    tracing::warn!(%reason, "Request unauthorized");
    GateOutcome::Unauthorized(reason)
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized(UNAUTHORIZED.into()))
}

/// Route-layer middleware: run the gate and attach the identity to the
/// request, or short-circuit with 401.
///
/// ```ignore
/// Router::new()
///     .route("/me", get(handler))
///     .route_layer(axum::middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.authorize(request.headers()).await {
        GateOutcome::Authorized(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        GateOutcome::Unauthorized(_) => unauthorized().into_response(),
    }
}

/// Extract the authenticated caller.
///
/// Reuses the identity attached by [`require_auth`] when present, otherwise
/// runs the gate itself.
///
/// ```ignore
/// async fn my_handler(identity: AuthorizedIdentity) -> AppResult<Json<()>> {
///     tracing::info!(user_id = identity.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
impl FromRequestParts<AppState> for AuthorizedIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<AuthorizedIdentity>() {
            return Ok(identity.clone());
        }
        match state.gate.authorize(&parts.headers).await {
            GateOutcome::Authorized(identity) => {
                parts.extensions.insert(identity.clone());
                Ok(identity)
            }
            GateOutcome::Unauthorized(_) => Err(unauthorized()),
        }
    }
}
