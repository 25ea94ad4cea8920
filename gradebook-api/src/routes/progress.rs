/// Progress sheet endpoints
///
/// A progress sheet holds one student's marks in one subject for one exam.
/// Percentage and grade are derived from the marks on every write.
///
/// # Endpoints
///
/// - `GET /v1/students/:id/progress` - A student's sheets with per-exam summaries
/// - `POST /v1/students/:id/progress` - Add a sheet for a student
/// - `GET /v1/progress/:id` - Get a sheet
/// - `PUT /v1/progress/:id` - Replace a sheet's subject, exam and marks
/// - `DELETE /v1/progress/:id` - Delete a sheet
/// - `POST /v1/progress/bulk` - Enter one exam's marks across subjects

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use gradebook_shared::{
    grading::{
        bulk::{self, SubjectMarks},
        grade::ScoredMarks,
        summary::{summarize, ExamSummary},
    },
    models::{
        exam_result::ExamResult,
        progress_sheet::{ExamType, ProgressSheet, ProgressSheetEntry, SheetData},
        student::Student,
        subject::Subject,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Create or update sheet request
///
/// The student comes from the path on create and is fixed on update.
#[derive(Debug, Deserialize)]
pub struct SheetRequest {
    pub subject_id: Uuid,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    pub marks_obtained: Decimal,
    pub max_marks: Decimal,
}

impl SheetRequest {
    fn into_sheet_data(self, student_id: Uuid) -> ApiResult<SheetData> {
        let scored = ScoredMarks::new(self.marks_obtained, self.max_marks)?;

        Ok(SheetData {
            student_id,
            subject_id: self.subject_id,
            exam_type: self.exam_type,
            exam_date: self.exam_date,
            scored,
        })
    }
}

/// A student's progress
#[derive(Debug, Serialize)]
pub struct StudentProgressResponse {
    pub student: Student,
    pub progress_sheets: Vec<ProgressSheetEntry>,
    pub exam_summaries: Vec<ExamSummary>,
    pub exam_results: Vec<ExamResult>,
}

/// Bulk entry request
///
/// ```json
/// {
///   "student_id": "uuid",
///   "exam_type": "midterm",
///   "exam_date": "2025-03-14",
///   "marks": {
///     "<subject_id>": { "marks_obtained": 45, "max_marks": 50 },
///     "<subject_id>": { "marks_obtained": 38 }
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct BulkEntryRequest {
    pub student_id: Uuid,
    pub exam_type: ExamType,
    pub exam_date: NaiveDate,
    #[serde(default)]
    pub marks: BTreeMap<Uuid, SubjectMarks>,
}

/// Bulk entry response
#[derive(Debug, Serialize)]
pub struct BulkEntryResponse {
    pub message: String,
    pub progress_sheets: Vec<ProgressSheet>,
    /// Absent when no subject had both values
    pub exam_result: Option<ExamResult>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Progress sheet not found".to_string())
}

fn student_not_found() -> ApiError {
    ApiError::NotFound("Student not found".to_string())
}

/// List a student's sheets
///
/// Sheets are ordered by exam date (newest first), exam type and subject
/// name. `exam_summaries` totals them per exam type in order of first appearance.
///
/// # Errors
///
/// - `404 Not Found`: No such student
pub async fn list_student_progress(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> ApiResult<Json<StudentProgressResponse>> {
    let student = Student::find_by_id(&state.db, student_id)
        .await?
        .ok_or_else(student_not_found)?;

    let (progress_sheets, exam_results) = tokio::try_join!(
        ProgressSheet::list_for_student(&state.db, student.id),
        ExamResult::list_for_student(&state.db, student.id),
    )?;

    let exam_summaries = summarize(progress_sheets.iter().map(|entry| &entry.sheet));

    Ok(Json(StudentProgressResponse {
        student,
        progress_sheets,
        exam_summaries,
        exam_results,
    }))
}

/// Add a sheet for a student
///
/// # Endpoint
///
/// ```text
/// POST /v1/students/:id/progress
/// Authorization: Bearer <jwt_token>
/// Content-Type: application/json
///
/// {
///   "subject_id": "uuid",
///   "exam_type": "quarterly",
///   "exam_date": "2025-01-20",
///   "marks_obtained": 45,
///   "max_marks": 50
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No such student
/// - `422 Unprocessable Entity`: Marks out of range, unknown subject, or a
///   sheet already exists for this subject and exam
pub async fn create_progress(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    Json(req): Json<SheetRequest>,
) -> ApiResult<(StatusCode, Json<ProgressSheet>)> {
    let data = req.into_sheet_data(student_id)?;

    if Student::find_by_id(&state.db, student_id).await?.is_none() {
        return Err(student_not_found());
    }

    let sheet = ProgressSheet::create(&state.db, data).await?;

    tracing::info!(
        sheet_id = %sheet.id,
        student_id = %sheet.student_id,
        grade = %sheet.grade,
        "Progress sheet added"
    );

    Ok((StatusCode::CREATED, Json(sheet)))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProgressSheet>> {
    let sheet = ProgressSheet::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(sheet))
}

/// Replace a sheet
///
/// Percentage and grade are recomputed. The exam result totals are only
/// refreshed by bulk entry.
pub async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SheetRequest>,
) -> ApiResult<Json<ProgressSheet>> {
    let existing = ProgressSheet::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    let data = req.into_sheet_data(existing.student_id)?;

    // None here means the sheet was deleted after the lookup
    let sheet = ProgressSheet::update(&state.db, id, data)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(sheet_id = %sheet.id, grade = %sheet.grade, "Progress sheet updated");

    Ok(Json(sheet))
}

pub async fn delete_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !ProgressSheet::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(sheet_id = %id, "Progress sheet deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Enter one exam's marks for a student across subjects
///
/// The whole submission is validated before anything is written; one bad
/// entry rejects all of them. Subjects with both values are upserted by
/// (student, subject, exam type, exam date), subjects with only one value
/// are skipped, and the exam result totals are upserted last. All writes
/// share one transaction.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Marks out of range (field `marks.<subject_id>.<field>`),
///   unknown subject (`marks.<subject_id>`) or unknown student (`student_id`)
pub async fn bulk_entry(
    State(state): State<AppState>,
    Json(req): Json<BulkEntryRequest>,
) -> ApiResult<Json<BulkEntryResponse>> {
    let mut details: Vec<ValidationErrorDetail> = Vec::new();

    let plan = match bulk::plan(&req.marks) {
        Ok(plan) => Some(plan),
        Err(violations) => {
            details.extend(
                violations
                    .into_iter()
                    .map(|v| ValidationErrorDetail::new(v.field(), v.error.to_string())),
            );
            None
        }
    };

    let student = Student::find_by_id(&state.db, req.student_id).await?;
    if student.is_none() {
        details.push(ValidationErrorDetail::new(
            "student_id",
            "Select a valid choice. That choice is not one of the available choices.",
        ));
    }

    let requested: Vec<Uuid> = req.marks.keys().copied().collect();
    let known: HashSet<Uuid> = Subject::existing_ids(&state.db, &requested)
        .await?
        .into_iter()
        .collect();

    details.extend(
        requested
            .iter()
            .filter(|id| !known.contains(id))
            .map(|id| ValidationErrorDetail::new(format!("marks.{id}"), "Unknown subject.")),
    );

    let (Some(plan), Some(student), true) = (plan, student, details.is_empty()) else {
        return Err(ApiError::ValidationError(details));
    };

    let mut tx = state.db.begin().await?;

    let mut progress_sheets = Vec::with_capacity(plan.sheets.len());
    for planned in &plan.sheets {
        let sheet = ProgressSheet::upsert(
            &mut *tx,
            SheetData {
                student_id: student.id,
                subject_id: planned.subject_id,
                exam_type: req.exam_type,
                exam_date: req.exam_date,
                scored: planned.scored,
            },
        )
        .await?;
        progress_sheets.push(sheet);
    }

    let exam_result = match &plan.totals {
        Some(totals) => Some(
            ExamResult::upsert(&mut *tx, student.id, req.exam_type, req.exam_date, totals).await?,
        ),
        None => None,
    };

    tx.commit().await?;

    tracing::info!(
        student_id = %student.id,
        exam_type = %req.exam_type,
        sheets = progress_sheets.len(),
        "Bulk marks entered"
    );

    Ok(Json(BulkEntryResponse {
        message: format!("Progress sheets added for {}.", student.full_name),
        progress_sheets,
        exam_result,
    }))
}
