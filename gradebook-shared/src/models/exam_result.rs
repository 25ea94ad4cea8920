/// Exam result model
///
/// One row per (student, exam type, exam date) holding the totals across all
/// subjects of that exam. Rows are written by bulk entry only.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::grading::bulk::ExamTotals;
use crate::models::progress_sheet::ExamType;

/// Aggregated marks for one student in one exam
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExamResult {
    pub id: Uuid,
    pub student_id: Uuid,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub total_marks: Decimal,
    pub max_possible_marks: Decimal,
    pub average_percentage: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamResult {
    /// Inserts or replaces the totals for (student, exam type, exam date)
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        student_id: Uuid,
        exam_type: ExamType,
        exam_date: NaiveDate,
        totals: &ExamTotals,
    ) -> Result<Self, sqlx::Error> {
        let result = sqlx::query_as::<_, ExamResult>(
            r#"
            INSERT INTO exam_results
                (id, student_id, exam_type, exam_date, total_marks,
                 max_possible_marks, average_percentage)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT exam_results_entry_key DO UPDATE
            SET total_marks = EXCLUDED.total_marks,
                max_possible_marks = EXCLUDED.max_possible_marks,
                average_percentage = EXCLUDED.average_percentage,
                updated_at = NOW()
            RETURNING id, student_id, exam_type, exam_date, total_marks,
                      max_possible_marks, average_percentage, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(exam_type)
        .bind(exam_date)
        .bind(totals.total_marks)
        .bind(totals.max_possible_marks)
        .bind(totals.average_percentage)
        .fetch_one(executor)
        .await?;

        Ok(result)
    }

    /// Lists a student's exam results, newest exam first
    ///
    /// Results on the same date are ordered by exam type name.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let results = sqlx::query_as::<_, ExamResult>(
            r#"
            SELECT id, student_id, exam_type, exam_date, total_marks,
                   max_possible_marks, average_percentage, created_at, updated_at
            FROM exam_results
            WHERE student_id = $1
            ORDER BY exam_date DESC, exam_type::text
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;

        Ok(results)
    }
}
