/// Subject catalog endpoints
///
/// # Endpoints
///
/// - `GET /v1/subjects` - List subjects by name
/// - `POST /v1/subjects` - Create a subject
/// - `GET /v1/subjects/:id` - Get a subject
/// - `PUT /v1/subjects/:id` - Replace a subject
/// - `DELETE /v1/subjects/:id` - Delete a subject and its progress sheets

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
use gradebook_shared::models::subject::{Subject, SubjectData};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create or update subject request
#[derive(Debug, Deserialize, Validate)]
pub struct SubjectRequest {
    #[validate(
        length(max = 100, message = "Ensure this value has at most 100 characters."),
        custom(function = "not_blank", message = "Subject name is required.")
    )]
    pub name: String,

    /// Unique, e.g. "MATH101"
    #[validate(
        length(max = 20, message = "Ensure this value has at most 20 characters."),
        custom(function = "not_blank", message = "Subject code is required.")
    )]
    pub code: String,

    #[serde(default)]
    pub description: String,
}

impl From<SubjectRequest> for SubjectData {
    fn from(req: SubjectRequest) -> Self {
        SubjectData {
            name: req.name.trim().to_string(),
            code: req.code.trim().to_string(),
            description: req.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSubjectsResponse {
    pub subjects: Vec<Subject>,
    pub count: usize,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Subject not found".to_string())
}

pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Json<ListSubjectsResponse>> {
    let subjects = Subject::list(&state.db).await?;

    Ok(Json(ListSubjectsResponse {
        count: subjects.len(),
        subjects,
    }))
}

/// Create a subject
///
/// # Endpoint
///
/// ```text
/// POST /v1/subjects
/// Authorization: Bearer <jwt_token>
/// Content-Type: application/json
///
/// { "name": "Mathematics", "code": "MATH101", "description": "Algebra and calculus" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or the code is taken
pub async fn create_subject(
    State(state): State<AppState>,
    Json(req): Json<SubjectRequest>,
) -> ApiResult<(StatusCode, Json<Subject>)> {
    req.validate()?;

    let subject = Subject::create(&state.db, req.into()).await?;

    tracing::info!(subject_id = %subject.id, code = %subject.code, "Subject created");

    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Subject>> {
    let subject = Subject::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(subject))
}

pub async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubjectRequest>,
) -> ApiResult<Json<Subject>> {
    req.validate()?;

    let subject = Subject::update(&state.db, id, req.into())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(subject_id = %subject.id, "Subject updated");

    Ok(Json(subject))
}

/// Delete a subject
///
/// Every progress sheet recorded for the subject goes with it.
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Subject::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(subject_id = %id, "Subject deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_defaults_to_empty() {
        let req: SubjectRequest =
            serde_json::from_str(r#"{"name": "Physics", "code": "PHY"}"#).unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.description, "");
    }

    #[test]
    fn test_blank_code_rejected() {
        let req = SubjectRequest {
            name: "Physics".to_string(),
            code: "  ".to_string(),
            description: String::new(),
        };

        let err = req.validate().unwrap_err();
        let errors = err.field_errors();
        assert!(errors.contains_key("code"));
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn test_long_name_rejected() {
        let req = SubjectRequest {
            name: "N".repeat(101),
            code: "LONG".to_string(),
            description: String::new(),
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_into_subject_data_trims() {
        let data: SubjectData = SubjectRequest {
            name: " Chemistry ".to_string(),
            code: " CHEM1 ".to_string(),
            description: "Lab work".to_string(),
        }
        .into();

        assert_eq!(data.name, "Chemistry");
        assert_eq!(data.code, "CHEM1");
        assert_eq!(data.description, "Lab work");
    }
}
