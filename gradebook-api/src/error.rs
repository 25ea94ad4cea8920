/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts to
/// an HTTP status code and a JSON body:
///
/// ```json
/// {
///   "error": "validation_error",
///   "message": "Request validation failed",
///   "details": [{ "field": "roll_number", "message": "..." }]
/// }
/// ```
///
/// # Example
///
/// ```ignore
/// use gradebook_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     let data = fetch_data().await?;
///     Ok(Json(json!({ "data": data })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gradebook_shared::{
    auth::{jwt::JwtError, middleware::AuthError, password::PasswordError},
    grading::{bulk::MarksViolation, grade::MarksError},
    mail::MailError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., OTP for an already verified account
    Conflict(String),

    /// Gone (410) - e.g., expired OTP, account removed
    Gone(String),

    /// Unprocessable entity (422) - validation errors and uniqueness conflicts
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Bad gateway (502) - an upstream service (mail) failed
    BadGateway(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Gone(msg) => write!(f, "Gone: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Gone(msg) => (StatusCode::GONE, "gone", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Field and message for a violated database constraint
///
/// Unique and check constraints are named explicitly in the migrations, so
/// the constraint name identifies the offending request field.
fn constraint_detail(constraint: &str) -> Option<ValidationErrorDetail> {
    let (field, message) = match constraint {
        "users_email_key" => ("email", "A user with that email already exists."),
        "users_username_key" => ("username", "A user with that username already exists."),
        "students_email_key" => ("email", "Student with this Email already exists."),
        "students_roll_number_key" => ("roll_number", "Student with this Roll number already exists."),
        "subjects_code_key" => ("code", "Subject with this Code already exists."),
        "progress_sheets_entry_key" => (
            "exam_date",
            "A progress sheet for this subject, exam type and exam date already exists.",
        ),
        "exam_results_entry_key" => (
            "exam_date",
            "An exam result for this exam type and exam date already exists.",
        ),
        "progress_sheets_marks_range" => ("marks_obtained", "Marks obtained must be between 0 and 100."),
        "progress_sheets_max_marks_range" => ("max_marks", "Max marks must be greater than 0 and at most 100."),
        "progress_sheets_marks_within_max" => (
            "marks_obtained",
            "Marks obtained cannot be greater than max marks.",
        ),
        "progress_sheets_subject_id_fkey" => ("subject_id", "Subject does not exist."),
        "progress_sheets_student_id_fkey" => ("student_id", "Student does not exist."),
        _ => return None,
    };

    Some(ValidationErrorDetail::new(field, message))
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(detail) = db_err.constraint().and_then(constraint_detail) {
                    return ApiError::ValidationError(vec![detail]);
                }

                if db_err.is_unique_violation() {
                    return ApiError::invalid("non_field_errors", "Record already exists.");
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert derive-based request validation errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

/// Convert marks range errors for a single sheet
impl From<Vec<MarksError>> for ApiError {
    fn from(errors: Vec<MarksError>) -> Self {
        ApiError::ValidationError(
            errors
                .into_iter()
                .map(|e| ValidationErrorDetail::new(e.field(), e.to_string()))
                .collect(),
        )
    }
}

/// Convert bulk entry violations
impl From<Vec<MarksViolation>> for ApiError {
    fn from(violations: Vec<MarksViolation>) -> Self {
        ApiError::ValidationError(
            violations
                .into_iter()
                .map(|v| ValidationErrorDetail::new(v.field(), v.error.to_string()))
                .collect(),
        )
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Missing credentials".to_string()),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::SessionEnded => ApiError::Unauthorized("Session has ended".to_string()),
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::DatabaseError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Token creation only happens server-side, so failures are internal
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

/// Convert mail delivery errors to API errors
impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::BadGateway(format!("Failed to send email: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("Student not found".to_string());
        assert_eq!(err.to_string(), "Not found: Student not found");

        let err = ApiError::Gone("OTP has expired".to_string());
        assert_eq!(err.to_string(), "Gone: OTP has expired");
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail::new("email", "Enter a valid email address."),
            ValidationErrorDetail::new("password", "This password is too short."),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_statuses() {
        let cases = [
            (ApiError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (ApiError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (ApiError::Conflict(String::new()), StatusCode::CONFLICT),
            (ApiError::Gone(String::new()), StatusCode::GONE),
            (ApiError::ValidationError(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::InternalError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::BadGateway(String::new()), StatusCode::BAD_GATEWAY),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_constraint_names_map_to_fields() {
        assert_eq!(
            constraint_detail("students_roll_number_key").unwrap().field,
            "roll_number"
        );
        assert_eq!(constraint_detail("subjects_code_key").unwrap().field, "code");
        assert_eq!(constraint_detail("users_email_key").unwrap().field, "email");
        assert_eq!(constraint_detail("users_username_key").unwrap().field, "username");
        assert!(constraint_detail("some_other_constraint").is_none());
    }

    #[test]
    fn test_marks_errors_convert_to_field_details() {
        let err = ApiError::from(vec![MarksError::MarksAboveMax]);

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "marks_obtained");
                assert_eq!(details[0].message, "Marks obtained cannot be greater than max marks.");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_mail_error_is_bad_gateway() {
        let err = ApiError::from(MailError::Transport("connection refused".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
