/// Student model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE class_batch AS ENUM ('FY', 'SY', 'TY', 'FYJC', 'SYJC');
///
/// CREATE TABLE students (
///     id UUID PRIMARY KEY,
///     full_name VARCHAR(200) NOT NULL,
///     email VARCHAR(254) NOT NULL UNIQUE,
///     roll_number VARCHAR(20) NOT NULL UNIQUE,
///     class_batch class_batch NOT NULL,
///     date_of_birth DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a student cascades to its progress sheets and exam results.
///
/// # Example
///
/// ```no_run
/// use gradebook_shared::models::student::{ClassBatch, Student, StudentData};
/// use chrono::NaiveDate;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let student = Student::create(&pool, StudentData {
///     full_name: "Asha Patil".to_string(),
///     email: "asha@example.com".to_string(),
///     roll_number: "FY-001".to_string(),
///     class_batch: ClassBatch::FirstYear,
///     date_of_birth: NaiveDate::from_ymd_opt(2006, 4, 12).unwrap(),
/// }).await?;
///
/// let all = Student::list(&pool).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::LazyLock;
use uuid::Uuid;

/// Maximum length of a roll number
pub const ROLL_NUMBER_MAX_LEN: usize = 20;

/// Alphanumeric, hyphens allowed only inside, at least two characters
static ROLL_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+[A-Za-z0-9-]*[A-Za-z0-9]+$").expect("roll number pattern compiles")
});

/// Class or batch a student belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "class_batch")]
pub enum ClassBatch {
    #[sqlx(rename = "FY")]
    #[serde(rename = "FY")]
    FirstYear,

    #[sqlx(rename = "SY")]
    #[serde(rename = "SY")]
    SecondYear,

    #[sqlx(rename = "TY")]
    #[serde(rename = "TY")]
    ThirdYear,

    #[sqlx(rename = "FYJC")]
    #[serde(rename = "FYJC")]
    FirstYearJuniorCollege,

    #[sqlx(rename = "SYJC")]
    #[serde(rename = "SYJC")]
    SecondYearJuniorCollege,
}

impl ClassBatch {
    /// Short code as stored
    pub fn code(&self) -> &'static str {
        match self {
            ClassBatch::FirstYear => "FY",
            ClassBatch::SecondYear => "SY",
            ClassBatch::ThirdYear => "TY",
            ClassBatch::FirstYearJuniorCollege => "FYJC",
            ClassBatch::SecondYearJuniorCollege => "SYJC",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            ClassBatch::FirstYear => "First Year",
            ClassBatch::SecondYear => "Second Year",
            ClassBatch::ThirdYear => "Third Year",
            ClassBatch::FirstYearJuniorCollege => "First Year Junior College",
            ClassBatch::SecondYearJuniorCollege => "Second Year Junior College",
        }
    }
}

/// Checks the roll number shape and length
pub fn is_valid_roll_number(roll_number: &str) -> bool {
    roll_number.len() <= ROLL_NUMBER_MAX_LEN && ROLL_NUMBER_RE.is_match(roll_number)
}

/// A student record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub roll_number: String,
    pub class_batch: ClassBatch,
    pub date_of_birth: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable student fields, used for both create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentData {
    pub full_name: String,
    pub email: String,
    pub roll_number: String,
    pub class_batch: ClassBatch,
    pub date_of_birth: NaiveDate,
}

impl Student {
    /// Creates a student
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `students_email_key` or
    /// `students_roll_number_key` when either value is taken.
    pub async fn create(pool: &PgPool, data: StudentData) -> Result<Self, sqlx::Error> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, full_name, email, roll_number, class_batch, date_of_birth)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, email, roll_number, class_batch, date_of_birth,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.roll_number)
        .bind(data.class_batch)
        .bind(data.date_of_birth)
        .fetch_one(pool)
        .await?;

        Ok(student)
    }

    /// Finds a student by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, full_name, email, roll_number, class_batch, date_of_birth,
                   created_at, updated_at
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(student)
    }

    /// Lists all students ordered by roll number
    ///
    /// This order is also the tie-break order of the ranking view.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, full_name, email, roll_number, class_batch, date_of_birth,
                   created_at, updated_at
            FROM students
            ORDER BY roll_number
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(students)
    }

    /// Replaces the editable fields of a student
    ///
    /// Returns None if the student doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: StudentData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET full_name = $2, email = $3, roll_number = $4, class_batch = $5,
                date_of_birth = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING id, full_name, email, roll_number, class_batch, date_of_birth,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.full_name)
        .bind(data.email)
        .bind(data.roll_number)
        .bind(data.class_batch)
        .bind(data.date_of_birth)
        .fetch_optional(pool)
        .await?;

        Ok(student)
    }

    /// Deletes a student and, by cascade, its progress sheets and exam results
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all students
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
