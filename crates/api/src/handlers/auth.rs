//! Handlers for account lifecycle: sign-up, sign-in, logout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use keygate_core::error::CoreError;
use keygate_db::models::user::{CreateUser, User, UserResponse};
use keygate_db::stores::USER_EXISTS;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use validator::Validate;

use super::validate_phone;
use crate::auth::password::CredentialHasher;
use crate::error::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::middleware::auth::{AuthorizedIdentity, TOKEN_COOKIE};
use crate::response::{MessageDataResponse, MessageResponse};
use crate::state::AppState;

/// Message for every failed sign-in, whichever check failed.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Salt used to burn an equivalent hash when the email is unknown, so a miss
/// costs as much as a wrong password.
const DECOY_SALT: &str = "a2V5Z2F0ZWRlY295c2FsdA";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /user/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, message = "First name must be at least 3 characters long"))]
    pub first_name: String,
    #[validate(length(min = 3, message = "Last name must be at least 3 characters long"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(
        length(min = 10, message = "Phone number must be at least 10 characters long"),
        custom(function = "validate_phone")
    )]
    pub phone: String,
}

/// Request body for `POST /user/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Payload returned by sign-up and sign-in.
#[derive(Debug, Serialize)]
pub struct SessionData {
    pub user: UserResponse,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/user/signup
///
/// Register a new account and return it with a fresh token. A duplicate email
/// is rejected with 409.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(email = %input.email, "Attempting user registration");

    if state.users.find_by_email(&input.email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(USER_EXISTS.into())));
    }

    let salt = state.hasher.generate_salt();
    let password_hash = hash_off_thread(&state.hasher, input.password, salt.clone()).await?;

    let user = state
        .users
        .create(&CreateUser {
            email: input.email,
            password_hash,
            salt,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: Some(input.phone),
        })
        .await?;

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = user.id, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&state, &token))],
        Json(MessageDataResponse {
            message: "User registered successfully",
            data: SessionData {
                user: UserResponse::from(&user),
                token,
            },
        }),
    ))
}

/// POST /api/v1/user/login
///
/// Exchange email + password for a token. Unknown email and wrong password
/// produce the same 401 body.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(email = %input.email, "Sign in attempt initiated");

    let Some(user) = state.users.find_by_email(&input.email).await? else {
        let _ = hash_off_thread(&state.hasher, input.password, DECOY_SALT.into()).await;
        tracing::warn!("Sign in rejected: unknown email");
        return Err(invalid_credentials());
    };

    let valid = verify_off_thread(&state.hasher, input.password, &user).await?;
    if !valid {
        tracing::warn!(user_id = user.id, "Sign in rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = user.id, "Authentication successful");

    Ok((
        [(SET_COOKIE, session_cookie(&state, &token))],
        Json(MessageDataResponse {
            message: "User logged in successfully",
            data: SessionData {
                user: UserResponse::from(&user),
                token,
            },
        }),
    ))
}

/// POST /api/v1/user/logout
///
/// Revoke the token that authenticated this request. The revocation write
/// runs on its own task, so it completes even if the client goes away.
pub async fn logout(
    State(state): State<AppState>,
    identity: AuthorizedIdentity,
) -> AppResult<impl IntoResponse> {
    let expires_at = identity
        .claims
        .expires_at()
        .ok_or_else(|| AppError::InternalError("Token expiry out of range".into()))?;

    let revocations = Arc::clone(&state.revocations);
    let token = identity.token;
    tokio::spawn(async move { revocations.add(&token, expires_at).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Revocation task failed: {e}")))??;

    tracing::info!(user_id = identity.user_id, "User logged out");

    Ok((
        [(SET_COOKIE, format!("{TOKEN_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))],
        Json(MessageResponse {
            message: "User logged out successfully",
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()))
}

/// Issue a token for `user` carrying their email as an extra claim.
fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    let mut claims = Map::new();
    claims.insert("email".into(), json!(user.email));
    state
        .tokens
        .issue(&user.id.to_string(), claims, state.config.jwt.ttl())
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}

/// `Set-Cookie` value carrying `token` for browser clients.
fn session_cookie(state: &AppState, token: &str) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        state.config.jwt.ttl().as_secs()
    )
}

/// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_off_thread(
    hasher: &Arc<CredentialHasher>,
    password: String,
    salt: String,
) -> AppResult<String> {
    let hasher = Arc::clone(hasher);
    tokio::task::spawn_blocking(move || hasher.hash(&password, &salt))
        .await
        .map_err(|e| AppError::InternalError(format!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalError(e.to_string()))
}

async fn verify_off_thread(
    hasher: &Arc<CredentialHasher>,
    password: String,
    user: &User,
) -> AppResult<bool> {
    let hasher = Arc::clone(hasher);
    let hash = user.password_hash.clone();
    let salt = user.salt.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash, &salt))
        .await
        .map_err(|e| AppError::InternalError(format!("Verification task failed: {e}")))?
        .map_err(|e| AppError::InternalError(e.to_string()))
}
