/// Student record endpoints
///
/// # Endpoints
///
/// - `GET /v1/students` - List students by roll number
/// - `POST /v1/students` - Create a student
/// - `GET /v1/students/:id` - Get a student
/// - `PUT /v1/students/:id` - Replace a student's details
/// - `DELETE /v1/students/:id` - Delete a student and their sheets and results

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::not_blank,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use gradebook_shared::models::student::{
    is_valid_roll_number, ClassBatch, Student, StudentData, ROLL_NUMBER_MAX_LEN,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create or update student request
#[derive(Debug, Deserialize, Validate)]
pub struct StudentRequest {
    #[validate(
        length(max = 200, message = "Ensure this value has at most 200 characters."),
        custom(function = "not_blank", message = "Full name is required.")
    )]
    pub full_name: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(custom(function = "roll_number_shape"))]
    pub roll_number: String,

    pub class_batch: ClassBatch,

    pub date_of_birth: NaiveDate,
}

impl From<StudentRequest> for StudentData {
    fn from(req: StudentRequest) -> Self {
        StudentData {
            full_name: req.full_name.trim().to_string(),
            email: req.email,
            roll_number: req.roll_number,
            class_batch: req.class_batch,
            date_of_birth: req.date_of_birth,
        }
    }
}

fn roll_number_shape(value: &str) -> Result<(), ValidationError> {
    let message = if value.trim().is_empty() {
        "Roll number is required."
    } else if value.len() > ROLL_NUMBER_MAX_LEN {
        "Ensure this value has at most 20 characters."
    } else if !is_valid_roll_number(value) {
        "Roll number must contain alphanumeric characters and hyphens only."
    } else {
        return Ok(());
    };

    let mut error = ValidationError::new("roll_number");
    error.message = Some(message.into());
    Err(error)
}

/// List students response
#[derive(Debug, Serialize)]
pub struct ListStudentsResponse {
    pub students: Vec<Student>,
    pub count: usize,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Student not found".to_string())
}

/// List all students ordered by roll number
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Json<ListStudentsResponse>> {
    let students = Student::list(&state.db).await?;

    Ok(Json(ListStudentsResponse {
        count: students.len(),
        students,
    }))
}

/// Create a student
///
/// # Endpoint
///
/// ```text
/// POST /v1/students
/// Authorization: Bearer <jwt_token>
/// Content-Type: application/json
///
/// {
///   "full_name": "Asha Patil",
///   "email": "asha@example.com",
///   "roll_number": "FY-042",
///   "class_batch": "FY",
///   "date_of_birth": "2006-04-12"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `422 Unprocessable Entity`: Validation failed, or the email or roll number is taken
pub async fn create_student(
    State(state): State<AppState>,
    Json(req): Json<StudentRequest>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    req.validate()?;

    let student = Student::create(&state.db, req.into()).await?;

    tracing::info!(student_id = %student.id, roll_number = %student.roll_number, "Student created");

    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Student>> {
    let student = Student::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(student))
}

/// Replace a student's details
///
/// # Errors
///
/// - `404 Not Found`: No such student
/// - `422 Unprocessable Entity`: Validation failed, or the email or roll number is taken
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StudentRequest>,
) -> ApiResult<Json<Student>> {
    req.validate()?;

    let student = Student::update(&state.db, id, req.into())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(student_id = %student.id, "Student updated");

    Ok(Json(student))
}

/// Delete a student
///
/// Progress sheets and exam results of the student are removed with it.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Student::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(student_id = %id, "Student deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(full_name: &str, roll_number: &str) -> StudentRequest {
        StudentRequest {
            full_name: full_name.to_string(),
            email: "asha@example.com".to_string(),
            roll_number: roll_number.to_string(),
            class_batch: ClassBatch::FirstYear,
            date_of_birth: NaiveDate::from_ymd_opt(2006, 4, 12).unwrap(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request("Asha Patil", "FY-042").validate().is_ok());
    }

    #[test]
    fn test_blank_full_name_rejected() {
        let err = request("   ", "FY-042").validate().unwrap_err();
        let errors = err.field_errors();
        let messages = &errors["full_name"];
        assert_eq!(
            messages[0].message.as_deref(),
            Some("Full name is required.")
        );
    }

    #[test]
    fn test_roll_number_messages() {
        let shape = roll_number_shape("-42").unwrap_err();
        assert_eq!(
            shape.message.as_deref(),
            Some("Roll number must contain alphanumeric characters and hyphens only.")
        );

        let blank = roll_number_shape("").unwrap_err();
        assert_eq!(blank.message.as_deref(), Some("Roll number is required."));

        let long = roll_number_shape(&"A".repeat(21)).unwrap_err();
        assert_eq!(
            long.message.as_deref(),
            Some("Ensure this value has at most 20 characters.")
        );

        assert!(roll_number_shape("SYJC-7").is_ok());
    }

    #[test]
    fn test_into_student_data_trims_name() {
        let data: StudentData = request("  Asha Patil ", "FY-042").into();
        assert_eq!(data.full_name, "Asha Patil");
        assert_eq!(data.class_batch, ClassBatch::FirstYear);
    }

    #[test]
    fn test_deserialize_class_batch_code() {
        let req: StudentRequest = serde_json::from_value(serde_json::json!({
            "full_name": "Ravi Kulkarni",
            "email": "ravi@example.com",
            "roll_number": "TY7",
            "class_batch": "SYJC",
            "date_of_birth": "2005-11-30"
        }))
        .unwrap();

        assert_eq!(req.class_batch, ClassBatch::SecondYearJuniorCollege);
    }
}
