//! Repository for the `revoked_tokens` table.

use keygate_core::types::Timestamp;
use sqlx::PgPool;

/// Append-only access to revoked tokens.
pub struct RevokedTokenRepo;

impl RevokedTokenRepo {
    /// Record a token as revoked.
    ///
    /// Re-inserting an existing token is a no-op. Returns `true` if a new row
    /// was written.
    pub async fn insert(
        pool: &PgPool,
        token: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO revoked_tokens (token, expires_at)
             VALUES ($1, $2)
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check whether a token has been revoked.
    pub async fn exists(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)")
                .bind(token)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Delete rows whose token expired at or before `cutoff`. Returns the
    /// count of deleted rows.
    pub async fn delete_expired(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
