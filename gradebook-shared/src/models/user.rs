/// User model and database operations
///
/// Users are the staff members who sign in to manage records. A user is
/// created unverified at signup and becomes verified once the emailed OTP is
/// confirmed; unverified users cannot log in.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email VARCHAR(254) NOT NULL,
///     username VARCHAR(150) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     is_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ,
///     CONSTRAINT users_email_key UNIQUE (email),
///     CONSTRAINT users_username_key UNIQUE (username)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use gradebook_shared::models::user::{User, CreateUser};
/// use gradebook_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "teacher@example.com".to_string(),
///     username: "teacher".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     is_verified: false,
///     is_staff: false,
/// }).await?;
///
/// let found = User::find_by_email(&pool, "teacher@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::sync::LazyLock;
use uuid::Uuid;

/// Letters, digits and `@ . + - _`
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+\z").expect("username pattern compiles"));

/// Checks that a username only uses letters, digits and `@ . + - _`
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

/// User account
///
/// Passwords are stored as Argon2id hashes and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Display name
    pub username: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the signup OTP has been confirmed
    pub is_verified: bool,

    /// Whether the user can see the admin summary
    pub is_staff: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never logged in)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub is_verified: bool,
    pub is_staff: bool,
}

/// Account totals shown on the admin summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserCounts {
    pub total: i64,
    pub verified: i64,
    pub unverified: i64,
}

const USER_COLUMNS: &str = "id, email, username, password_hash, is_verified, is_staff, \
     created_at, updated_at, last_login_at";

impl User {
    /// Creates a new user
    ///
    /// Takes any executor so signup can create the user and its first OTP in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (`users_email_key` violation)
    /// - Database connection fails
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_verified, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.email)
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.is_verified)
            .bind(data.is_staff)
            .fetch_one(executor)
            .await?;

        Ok(user)
    }

    /// Creates a user unless the email or username is already taken
    ///
    /// Used to bootstrap the first staff account at startup. Returns None when
    /// a matching user already exists; the existing row is left as is.
    pub async fn create_if_absent(
        pool: &PgPool,
        data: CreateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_verified, is_staff)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.email)
            .bind(data.username)
            .bind(data.password_hash)
            .bind(data.is_verified)
            .bind(data.is_staff)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// The lookup is exact; emails are stored as submitted.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Checks whether an email is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Checks whether a username is already registered
    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Marks a user as verified
    pub async fn mark_verified(executor: impl PgExecutor<'_>, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Deletes a user by ID
    ///
    /// Cascades to the user's OTP codes and sessions.
    ///
    /// # Returns
    ///
    /// True if user was deleted, false if user didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp for a user
    pub async fn update_last_login(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Counts users, split by verification state
    pub async fn counts(pool: &PgPool) -> Result<UserCounts, sqlx::Error> {
        let counts = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_verified) AS verified,
                   COUNT(*) FILTER (WHERE NOT is_verified) AS unverified
            FROM users
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}
