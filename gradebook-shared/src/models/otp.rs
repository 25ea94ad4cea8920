/// OTP code storage
///
/// Every signup (and every resend) stores a fresh code; only the most recently
/// created code for a user is ever checked. Codes are removed together with
/// their user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// A one-time code issued to a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Six ASCII digits
    #[serde(skip_serializing)]
    pub code: String,

    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    /// Stores a new code for a user
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        code: &str,
    ) -> Result<Self, sqlx::Error> {
        let otp = sqlx::query_as::<_, OtpCode>(
            r#"
            INSERT INTO otp_codes (id, user_id, code)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, is_verified, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(code)
        .fetch_one(executor)
        .await?;

        Ok(otp)
    }

    /// Most recently created code for a user
    pub async fn latest_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let otp = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT id, user_id, code, is_verified, created_at
            FROM otp_codes
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(otp)
    }

    /// Marks a code as used
    ///
    /// Returns false if the code was already used, so a code verifies at most once.
    pub async fn mark_verified(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE otp_codes SET is_verified = TRUE WHERE id = $1 AND NOT is_verified")
                .bind(id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
