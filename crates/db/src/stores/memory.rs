//! In-process store implementations.
//!
//! Used by the test suites and by `STORE_BACKEND=memory` local runs. Contents
//! are lost when the process exits.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use keygate_core::error::CoreError;
use keygate_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use super::{RevocationStore, UserDirectory, USER_EXISTS};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Default)]
struct UserTable {
    last_id: DbId,
    rows: BTreeMap<DbId, User>,
}

impl UserTable {
    fn email_taken(&self, email: &str, except: Option<DbId>) -> bool {
        self.rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// [`UserDirectory`] backed by a map behind an async `RwLock`.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    table: RwLock<UserTable>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, CoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, input: &CreateUser) -> Result<User, CoreError> {
        let mut table = self.table.write().await;
        if table.email_taken(&input.email, None) {
            return Err(CoreError::Conflict(USER_EXISTS.into()));
        }
        table.last_id += 1;
        let now = Utc::now();
        let user = User {
            id: table.last_id,
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            salt: input.salt.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            phone: input.phone.clone(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: DbId, input: &UpdateUser) -> Result<Option<User>, CoreError> {
        let mut table = self.table.write().await;
        if let Some(email) = &input.email {
            if table.email_taken(email, Some(id)) {
                return Err(CoreError::Conflict(USER_EXISTS.into()));
            }
        }
        let Some(user) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = &input.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &input.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(email) = &input.email {
            user.email = email.clone();
        }
        if let Some(phone) = &input.phone {
            user.phone = Some(phone.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

/// [`RevocationStore`] backed by a map of token to expiry.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, Timestamp>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn add(&self, token: &str, expires_at: Timestamp) -> Result<(), CoreError> {
        self.entries
            .write()
            .await
            .entry(token.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, CoreError> {
        Ok(self.entries.read().await.contains_key(token))
    }

    async fn prune_expired(&self, now: Timestamp) -> Result<u64, CoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}
