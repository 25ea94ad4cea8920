/// Subject model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subjects (
///     id UUID PRIMARY KEY,
///     name VARCHAR(100) NOT NULL,
///     code VARCHAR(20) NOT NULL UNIQUE,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A subject students can be marked in
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Editable subject fields, used for both create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectData {
    pub name: String,
    pub code: String,
    pub description: String,
}

impl Subject {
    /// Creates a subject
    ///
    /// Fails with a unique violation on `subjects_code_key` if the code is taken.
    pub async fn create(pool: &PgPool, data: SubjectData) -> Result<Self, sqlx::Error> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (id, name, code, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, code, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(subject)
    }

    /// Finds a subject by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name, code, description, created_at FROM subjects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(subject)
    }

    /// Lists all subjects ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, name, code, description, created_at FROM subjects ORDER BY name, code",
        )
        .fetch_all(pool)
        .await?;

        Ok(subjects)
    }

    /// Returns which of `ids` exist
    pub async fn existing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        let found: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM subjects WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

        Ok(found.into_iter().map(|(id,)| id).collect())
    }

    /// Replaces the editable fields of a subject
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: SubjectData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects
            SET name = $2, code = $3, description = $4
            WHERE id = $1
            RETURNING id, name, code, description, created_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.code)
        .bind(data.description)
        .fetch_optional(pool)
        .await?;

        Ok(subject)
    }

    /// Deletes a subject and, by cascade, its progress sheets
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all subjects
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subjects")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
