/// Login sessions
///
/// A session row backs every issued access token. The token carries the
/// session ID, so deleting the row (logout) revokes the token even before it
/// expires.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A live login session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A session joined with the flags of its user, as needed by the auth layer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_verified: bool,
    pub is_staff: bool,
}

impl Session {
    /// Opens a session for a user lasting `ttl`
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(executor)
        .await?;

        Ok(session)
    }

    /// Loads an unexpired session owned by `user_id`
    pub async fn find_active(
        pool: &PgPool,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ActiveSession>, sqlx::Error> {
        let session = sqlx::query_as::<_, ActiveSession>(
            r#"
            SELECT s.id AS session_id, s.user_id, s.expires_at,
                   u.is_verified, u.is_staff
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.user_id = $2 AND s.expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Ends a session
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes expired sessions of one user
    ///
    /// Called on login so stale rows don't pile up.
    pub async fn purge_expired(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= NOW()")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
