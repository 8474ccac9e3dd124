//! Store traits consumed by the API layer.
//!
//! Handlers and the auth gate hold these as `Arc<dyn _>` so the same code runs
//! against PostgreSQL in production ([`postgres`]) and an in-process map in
//! tests and local runs ([`memory`]).

use async_trait::async_trait;
use keygate_core::error::CoreError;
use keygate_core::types::{DbId, Timestamp};

use crate::models::user::{CreateUser, UpdateUser, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryRevocationStore, InMemoryUserDirectory};
pub use postgres::{PgRevocationStore, PgUserDirectory};

/// Entity name used in [`CoreError::NotFound`] for user lookups.
pub const USER_ENTITY: &str = "User";

/// Message carried by [`CoreError::Conflict`] on duplicate sign-up.
pub const USER_EXISTS: &str = "User already exists";

/// Lookup and mutation of credential and profile records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, CoreError>;

    /// Fails with [`CoreError::Conflict`] when the email is already taken.
    async fn create(&self, input: &CreateUser) -> Result<User, CoreError>;

    /// Returns `None` when no user has the given id.
    async fn update(&self, id: DbId, input: &UpdateUser) -> Result<Option<User>, CoreError>;

    /// Returns `false` when no user has the given id.
    async fn delete(&self, id: DbId) -> Result<bool, CoreError>;
}

/// Durable, append-only set of revoked token strings.
///
/// Revocation is monotonic: once [`add`](Self::add) returns `Ok`, every later
/// [`contains`](Self::contains) for the same string returns `true` until the
/// entry is pruned after the token's own expiry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Idempotent; adding a present token is not an error.
    async fn add(&self, token: &str, expires_at: Timestamp) -> Result<(), CoreError>;

    async fn contains(&self, token: &str) -> Result<bool, CoreError>;

    /// Drop entries whose token expired at or before `now`. Returns how many
    /// entries were removed.
    async fn prune_expired(&self, now: Timestamp) -> Result<u64, CoreError>;
}
