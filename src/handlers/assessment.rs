// src/handlers/assessment.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    content::placement_passage,
    error::AppError,
    handlers::{require_student, score_attempt},
    models::{
        activity::{ActivityType, NewActivityLog},
        assessment::{Assessment, AssessmentPassage, NewAssessment},
        session::SubmitSessionRequest,
    },
    scoring::{refresh_rankings, scorer::count_words},
    state::AppState,
    utils::jwt::{ApprovedUser, CurrentUser},
};

/// Returns the placement passage.
#[utoipa::path(
    get,
    path = "/api/assessments/passage",
    tag = "assessments",
    security(("bearer" = [])),
    responses((status = 200, body = AssessmentPassage))
)]
pub async fn get_passage(CurrentUser(_user): CurrentUser) -> Json<AssessmentPassage> {
    let content = placement_passage();
    Json(AssessmentPassage {
        content: content.to_string(),
        word_count: count_words(content),
    })
}

/// Scores a placement attempt and assigns the student's level.
///
/// Retaking the assessment is allowed; the latest result sets the level.
#[utoipa::path(
    post,
    path = "/api/assessments",
    tag = "assessments",
    security(("bearer" = [])),
    request_body = SubmitSessionRequest,
    responses(
        (status = 201, description = "Assessment stored and level assigned", body = Assessment),
        (status = 400, description = "Invalid attempt"),
        (status = 403, description = "Account not approved"),
    )
)]
pub async fn submit_assessment(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    Json(payload): Json<SubmitSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_student(&user)?;

    let attempt = score_attempt(placement_passage(), &payload, state.policy)?;
    let level = state
        .policy
        .placement_level(attempt.wpm.max(0) as u32, attempt.accuracy.max(0) as u32);

    let assessment = state
        .store
        .insert_assessment(NewAssessment {
            student_id: user.id,
            wpm: attempt.wpm,
            accuracy: attempt.accuracy,
            error_count: attempt.error_count,
            assigned_level: level,
        })
        .await?;

    state
        .store
        .append_activity(NewActivityLog {
            user_id: user.id,
            activity_type: ActivityType::Assessment,
            lesson_id: None,
            duration_seconds: attempt.time_spent_seconds,
            wpm: attempt.wpm,
            accuracy: attempt.accuracy,
            errors: attempt.error_count,
            text_content: payload.input,
        })
        .await?;

    state.store.set_user_level(user.id, level).await?;

    tracing::info!(
        "Student {} placed at {} ({} wpm, {}% accuracy)",
        user.id,
        level,
        attempt.wpm,
        attempt.accuracy
    );

    // The level is the leaderboard category.
    if let Err(e) = refresh_rankings(state.store.as_ref(), state.policy).await {
        tracing::error!("Ranking refresh after assessment failed: {}", e);
    }

    Ok((StatusCode::CREATED, Json(assessment)))
}
