/// Student ranking endpoint
///
/// # Endpoint
///
/// ```text
/// GET /v1/ranking?exam_type=midterm
/// Authorization: Bearer <jwt_token>
/// ```
///
/// A missing or unknown `exam_type` falls back to `quarterly`.
///
/// # Response
///
/// ```json
/// {
///   "exam_type": "midterm",
///   "exam_types": [{ "value": "quarterly", "label": "Quarterly" }, ...],
///   "rankings": [
///     {
///       "rank": 1,
///       "student_id": "uuid",
///       "full_name": "Asha Patil",
///       "roll_number": "FY-042",
///       "class_batch": "FY",
///       "total_marks": 182.5,
///       "max_marks": 200,
///       "average_percentage": 91.25,
///       "subject_count": 2
///     }
///   ]
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use gradebook_shared::{
    grading::ranking::{rank_students, RankedStudent},
    models::{
        progress_sheet::{ExamType, ProgressSheet},
        student::Student,
    },
};
use serde::{Deserialize, Serialize};

/// Ranking query parameters
#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub exam_type: Option<String>,
}

/// Selectable exam type
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExamTypeOption {
    pub value: ExamType,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub exam_type: ExamType,
    pub exam_types: Vec<ExamTypeOption>,
    pub rankings: Vec<RankedStudent>,
}

fn exam_type_options() -> Vec<ExamTypeOption> {
    ExamType::ALL
        .iter()
        .map(|&exam_type| ExamTypeOption {
            value: exam_type,
            label: exam_type.label(),
        })
        .collect()
}

/// Rank every student with at least one sheet of the selected exam type
///
/// Students are ordered by average percentage, highest first. Equal averages
/// keep roll number order and still get distinct ranks.
pub async fn ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<RankingResponse>> {
    let exam_type = ExamType::parse_or_default(query.exam_type.as_deref());

    let (students, sheets) = tokio::try_join!(
        Student::list(&state.db),
        ProgressSheet::list_by_exam_type(&state.db, exam_type),
    )?;

    let rankings = rank_students(exam_type, &students, &sheets);

    tracing::debug!(exam_type = %exam_type, ranked = rankings.len(), "Ranking computed");

    Ok(Json(RankingResponse {
        exam_type,
        exam_types: exam_type_options(),
        rankings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_type_options_cover_all_types_in_order() {
        let options = exam_type_options();

        assert_eq!(options.len(), 4);
        assert_eq!(options[0].value, ExamType::Quarterly);
        assert_eq!(options[3].value, ExamType::EndTerm);
        assert!(options.iter().all(|o| !o.label.is_empty()));
    }

    #[test]
    fn test_options_serialize_wire_values() {
        let json = serde_json::to_value(exam_type_options()).unwrap();

        assert_eq!(json[1]["value"], "midterm");
        assert_eq!(json[3]["value"], "end_term");
    }
}
