/// Dashboard endpoints
///
/// - `GET /v1/dashboard` - The signed-in user
/// - `GET /v1/dashboard/admin` - Record counts (staff only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use gradebook_shared::{
    auth::middleware::AuthContext,
    models::{
        progress_sheet::ProgressSheet,
        student::Student,
        subject::Subject,
        user::{User, UserCounts},
    },
};
use serde::{Deserialize, Serialize};

/// Dashboard home response
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: User,
}

/// Admin summary response
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSummary {
    pub users: UserCounts,
    pub students: i64,
    pub progress_sheets: i64,
    pub subjects: i64,
}

pub async fn home(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<DashboardResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session has ended".to_string()))?;

    Ok(Json(DashboardResponse { user }))
}

/// Counts of users (total, verified, unverified), students, progress sheets and subjects
pub async fn admin_summary(State(state): State<AppState>) -> ApiResult<Json<AdminSummary>> {
    let (users, students, progress_sheets, subjects) = tokio::try_join!(
        User::counts(&state.db),
        Student::count(&state.db),
        ProgressSheet::count(&state.db),
        Subject::count(&state.db),
    )?;

    Ok(Json(AdminSummary {
        users,
        students,
        progress_sheets,
        subjects,
    }))
}
