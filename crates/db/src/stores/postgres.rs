//! PostgreSQL-backed store implementations.

use async_trait::async_trait;
use keygate_core::error::CoreError;
use keygate_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use super::{RevocationStore, UserDirectory, USER_EXISTS};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{RevokedTokenRepo, UserRepo};

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Translate a sqlx error into the domain taxonomy.
///
/// Unique violations become [`CoreError::Conflict`]; everything else is logged
/// and surfaced as an opaque [`CoreError::Internal`].
fn store_error(context: &'static str, err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return CoreError::Conflict(USER_EXISTS.into());
        }
    }
    tracing::error!(error = %err, context, "Database error");
    CoreError::Internal(format!("{context}: {err}"))
}

/// [`UserDirectory`] over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_email(&self.pool, email)
            .await
            .map_err(|e| store_error("find user by email", e))
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(|e| store_error("find user by id", e))
    }

    async fn create(&self, input: &CreateUser) -> Result<User, CoreError> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(|e| store_error("create user", e))
    }

    async fn update(&self, id: DbId, input: &UpdateUser) -> Result<Option<User>, CoreError> {
        UserRepo::update(&self.pool, id, input)
            .await
            .map_err(|e| store_error("update user", e))
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        UserRepo::delete(&self.pool, id)
            .await
            .map_err(|e| store_error("delete user", e))
    }
}

/// [`RevocationStore`] over the `revoked_tokens` table.
///
/// Each call is a single autocommit statement, so a successful `add` is
/// durable before it returns.
#[derive(Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn add(&self, token: &str, expires_at: Timestamp) -> Result<(), CoreError> {
        let inserted = RevokedTokenRepo::insert(&self.pool, token, expires_at)
            .await
            .map_err(|e| store_error("revoke token", e))?;
        if !inserted {
            tracing::debug!("Token already revoked");
        }
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, CoreError> {
        RevokedTokenRepo::exists(&self.pool, token)
            .await
            .map_err(|e| store_error("check revoked token", e))
    }

    async fn prune_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        RevokedTokenRepo::delete_expired(&self.pool, now)
            .await
            .map_err(|e| store_error("prune revoked tokens", e))
    }
}
