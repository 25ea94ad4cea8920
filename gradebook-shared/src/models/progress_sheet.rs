/// Progress sheet model and database operations
///
/// A progress sheet is one student's marks in one subject for one exam. The
/// (student, subject, exam type, exam date) tuple is unique, and percentage and
/// grade are written from a [`ScoredMarks`] on every save so they never drift
/// from the marks.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE exam_type AS ENUM ('quarterly', 'midterm', 'model', 'end_term');
///
/// CREATE TABLE progress_sheets (
///     id UUID PRIMARY KEY,
///     student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
///     subject_id UUID NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
///     exam_type exam_type NOT NULL,
///     exam_date DATE NOT NULL,
///     marks_obtained NUMERIC(5, 2) NOT NULL,
///     max_marks NUMERIC(5, 2) NOT NULL,
///     percentage NUMERIC(5, 2) NOT NULL,
///     grade VARCHAR(3) NOT NULL,
///     ...
///     CONSTRAINT progress_sheets_entry_key
///         UNIQUE (student_id, subject_id, exam_type, exam_date)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::grading::grade::ScoredMarks;

/// Kind of exam a sheet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "exam_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    Quarterly,
    Midterm,
    Model,
    EndTerm,
}

impl ExamType {
    /// Every exam type, in display order
    pub const ALL: [ExamType; 4] = [
        ExamType::Quarterly,
        ExamType::Midterm,
        ExamType::Model,
        ExamType::EndTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Quarterly => "quarterly",
            ExamType::Midterm => "midterm",
            ExamType::Model => "model",
            ExamType::EndTerm => "end_term",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExamType::Quarterly => "Quarterly",
            ExamType::Midterm => "Midterm",
            ExamType::Model => "Model",
            ExamType::EndTerm => "End Term",
        }
    }

    /// Parses a query value, falling back to quarterly when missing or unknown
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(ExamType::Quarterly)
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no exam type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown exam type: {0}")]
pub struct UnknownExamType(pub String);

impl FromStr for ExamType {
    type Err = UnknownExamType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExamType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownExamType(s.to_string()))
    }
}

/// A stored progress sheet
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressSheet {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub marks_obtained: Decimal,
    pub max_marks: Decimal,
    pub percentage: Decimal,
    /// Letter grade as stored (`A+` .. `F`)
    pub grade: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sheet joined with its subject, as listed on a student's record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressSheetEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sheet: ProgressSheet,
    pub subject_name: String,
    pub subject_code: String,
}

/// Input for writing a sheet
///
/// `scored` carries validated marks plus the derived percentage and grade.
#[derive(Debug, Clone, Copy)]
pub struct SheetData {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub scored: ScoredMarks,
}

const SHEET_COLUMNS: &str = "id, student_id, subject_id, exam_type, exam_date, marks_obtained, \
     max_marks, percentage, grade, created_at, updated_at";

impl ProgressSheet {
    /// Inserts a new sheet
    ///
    /// Fails with a unique violation on `progress_sheets_entry_key` when a
    /// sheet already exists for the same student, subject and exam.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: SheetData,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO progress_sheets
                (id, student_id, subject_id, exam_type, exam_date,
                 marks_obtained, max_marks, percentage, grade)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SHEET_COLUMNS}
            "#
        );

        let sheet = sqlx::query_as::<_, ProgressSheet>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.student_id)
            .bind(data.subject_id)
            .bind(data.exam_type)
            .bind(data.exam_date)
            .bind(data.scored.marks_obtained)
            .bind(data.scored.max_marks)
            .bind(data.scored.percentage)
            .bind(data.scored.grade.as_str())
            .fetch_one(executor)
            .await?;

        Ok(sheet)
    }

    /// Inserts a sheet, or overwrites the marks of the existing one with the same key
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        data: SheetData,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO progress_sheets
                (id, student_id, subject_id, exam_type, exam_date,
                 marks_obtained, max_marks, percentage, grade)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT ON CONSTRAINT progress_sheets_entry_key DO UPDATE
            SET marks_obtained = EXCLUDED.marks_obtained,
                max_marks = EXCLUDED.max_marks,
                percentage = EXCLUDED.percentage,
                grade = EXCLUDED.grade,
                updated_at = NOW()
            RETURNING {SHEET_COLUMNS}
            "#
        );

        let sheet = sqlx::query_as::<_, ProgressSheet>(&sql)
            .bind(Uuid::new_v4())
            .bind(data.student_id)
            .bind(data.subject_id)
            .bind(data.exam_type)
            .bind(data.exam_date)
            .bind(data.scored.marks_obtained)
            .bind(data.scored.max_marks)
            .bind(data.scored.percentage)
            .bind(data.scored.grade.as_str())
            .fetch_one(executor)
            .await?;

        Ok(sheet)
    }

    /// Finds a sheet by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {SHEET_COLUMNS} FROM progress_sheets WHERE id = $1");

        let sheet = sqlx::query_as::<_, ProgressSheet>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(sheet)
    }

    /// Rewrites a sheet in place
    ///
    /// The owning student never changes: `data.student_id` must be the
    /// sheet's current student or nothing is updated and None is returned.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: SheetData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE progress_sheets
            SET subject_id = $3, exam_type = $4, exam_date = $5,
                marks_obtained = $6, max_marks = $7, percentage = $8, grade = $9,
                updated_at = NOW()
            WHERE id = $1 AND student_id = $2
            RETURNING {SHEET_COLUMNS}
            "#
        );

        let sheet = sqlx::query_as::<_, ProgressSheet>(&sql)
            .bind(id)
            .bind(data.student_id)
            .bind(data.subject_id)
            .bind(data.exam_type)
            .bind(data.exam_date)
            .bind(data.scored.marks_obtained)
            .bind(data.scored.max_marks)
            .bind(data.scored.percentage)
            .bind(data.scored.grade.as_str())
            .fetch_optional(pool)
            .await?;

        Ok(sheet)
    }

    /// Lists a student's sheets with subject names
    ///
    /// Ordered by exam date (newest first), then exam type name
    /// alphabetically, then subject name.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<ProgressSheetEntry>, sqlx::Error> {
        let entries = sqlx::query_as::<_, ProgressSheetEntry>(
            r#"
            SELECT p.id, p.student_id, p.subject_id, p.exam_type, p.exam_date,
                   p.marks_obtained, p.max_marks, p.percentage, p.grade,
                   p.created_at, p.updated_at,
                   s.name AS subject_name, s.code AS subject_code
            FROM progress_sheets p
            JOIN subjects s ON s.id = p.subject_id
            WHERE p.student_id = $1
            ORDER BY p.exam_date DESC, p.exam_type::text, s.name
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Lists every sheet of one exam type
    pub async fn list_by_exam_type(
        pool: &PgPool,
        exam_type: ExamType,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {SHEET_COLUMNS} FROM progress_sheets WHERE exam_type = $1 ORDER BY student_id, exam_date"
        );

        let sheets = sqlx::query_as::<_, ProgressSheet>(&sql)
            .bind(exam_type)
            .fetch_all(pool)
            .await?;

        Ok(sheets)
    }

    /// Deletes a sheet
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM progress_sheets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all sheets
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM progress_sheets")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_type_round_trips_through_str() {
        for exam_type in ExamType::ALL {
            assert_eq!(exam_type.as_str().parse::<ExamType>().unwrap(), exam_type);
        }
    }

    #[test]
    fn test_parse_or_default_falls_back_to_quarterly() {
        assert_eq!(ExamType::parse_or_default(None), ExamType::Quarterly);
        assert_eq!(ExamType::parse_or_default(Some("final")), ExamType::Quarterly);
        assert_eq!(ExamType::parse_or_default(Some("")), ExamType::Quarterly);
        assert_eq!(ExamType::parse_or_default(Some("end_term")), ExamType::EndTerm);
    }

    #[test]
    fn test_exam_type_serde_is_snake_case() {
        assert_eq!(serde_json::to_string(&ExamType::EndTerm).unwrap(), "\"end_term\"");
        let parsed: ExamType = serde_json::from_str("\"midterm\"").unwrap();
        assert_eq!(parsed, ExamType::Midterm);
    }

    #[test]
    fn test_unknown_exam_type_error() {
        let err = "annual".parse::<ExamType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown exam type: annual");
    }
}
