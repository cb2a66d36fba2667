// src/handlers/lessons.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    handlers::{require_student, score_attempt},
    models::{
        activity::{ActivityType, NewActivityLog},
        lesson::Lesson,
        ranking::RankingRecord,
        session::{SessionResponse, SessionResult, SubmitSessionRequest},
        user::{Role, User},
    },
    scoring::refresh_rankings,
    state::AppState,
    store::Store,
    utils::jwt::ApprovedUser,
};

/// The last stored ranking, or `None` if it cannot be read.
async fn stored_ranking(store: &dyn Store, user_id: i64) -> Option<RankingRecord> {
    match store.get_ranking(user_id).await {
        Ok(ranking) => ranking,
        Err(e) => {
            tracing::error!("Failed to load ranking for user {}: {}", user_id, e);
            None
        }
    }
}

/// Admins see every lesson; students only their level and `All`.
fn ensure_offered(lesson: &Lesson, user: &User) -> Result<(), AppError> {
    if user.role == Role::Admin || lesson.level.is_offered_to(user.level) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "This lesson is not offered at your level".to_string(),
        ))
    }
}

/// Lists lessons offered to the current student, newest first.
#[utoipa::path(
    get,
    path = "/api/lessons",
    tag = "lessons",
    security(("bearer" = [])),
    responses((status = 200, body = Vec<Lesson>))
)]
pub async fn list_lessons(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
) -> Result<impl IntoResponse, AppError> {
    let lessons: Vec<Lesson> = state
        .store
        .list_lessons(None)
        .await?
        .into_iter()
        .filter(|lesson| ensure_offered(lesson, &user).is_ok())
        .collect();

    Ok(Json(lessons))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{id}",
    tag = "lessons",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 200, body = Lesson),
        (status = 403, description = "Lesson not offered at the student's level"),
        (status = 404, description = "Lesson not found"),
    )
)]
pub async fn get_lesson(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = state.store.get_lesson(id).await?;
    ensure_offered(&lesson, &user)?;
    Ok(Json(lesson))
}

/// Scores and records one attempt at a lesson.
///
/// Stores the latest result for (student, lesson), appends an activity
/// entry, then refreshes the rankings. The response carries the student's
/// new ranking and any certificate earned by this attempt.
#[utoipa::path(
    post,
    path = "/api/lessons/{id}/sessions",
    tag = "lessons",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = SubmitSessionRequest,
    responses(
        (status = 200, body = SessionResponse),
        (status = 400, description = "Incomplete attempt or invalid timestamps"),
        (status = 403, description = "Account not approved or lesson not offered"),
        (status = 404, description = "Lesson not found"),
    )
)]
pub async fn submit_session(
    State(state): State<AppState>,
    ApprovedUser(user): ApprovedUser,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_student(&user)?;

    let lesson = state.store.get_lesson(id).await?;
    ensure_offered(&lesson, &user)?;

    let attempt = score_attempt(&lesson.content, &payload, state.policy)?;

    let stored = state
        .store
        .upsert_progress(SessionResult {
            student_id: user.id,
            lesson_id: lesson.id,
            started_at: payload.started_at,
            finished_at: payload.finished_at,
            raw_input: payload.input.clone(),
            wpm: attempt.wpm,
            accuracy: attempt.accuracy,
            error_count: attempt.error_count,
            time_spent_seconds: attempt.time_spent_seconds,
            completed: attempt.completed,
            updated_at: Utc::now(),
        })
        .await?;

    state
        .store
        .append_activity(NewActivityLog {
            user_id: user.id,
            activity_type: ActivityType::Lesson,
            lesson_id: Some(lesson.id),
            duration_seconds: attempt.time_spent_seconds,
            wpm: attempt.wpm,
            accuracy: attempt.accuracy,
            errors: attempt.error_count,
            text_content: payload.input,
        })
        .await?;

    tracing::debug!(
        "Session stored: student {} lesson {} ({} wpm, {}%)",
        user.id,
        lesson.id,
        attempt.wpm,
        attempt.accuracy
    );

    // The attempt is already saved; a failed refresh only leaves the
    // previous ranking in place until the next trigger.
    let refreshed = refresh_rankings(state.store.as_ref(), state.policy).await;
    let (ranking, certificates) = match refreshed {
        Ok(outcome) => (outcome.ranking_for(user.id).cloned(), outcome.issued_to(user.id)),
        Err(e) => {
            tracing::error!("Ranking refresh after session failed: {}", e);
            (stored_ranking(state.store.as_ref(), user.id).await, Vec::new())
        }
    };

    Ok(Json(SessionResponse {
        wpm: stored.wpm,
        accuracy: stored.accuracy,
        error_count: stored.error_count,
        time_spent_seconds: stored.time_spent_seconds,
        completed: stored.completed,
        ranking,
        certificates,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        models::user::{AccountStatus, NewUser},
        scoring::ScoringPolicy,
        store::testing::FlakyStore,
    };

    #[tokio::test]
    async fn unreadable_ranking_falls_back_to_none() {
        let store = FlakyStore::default();
        let user = store
            .create_user(NewUser {
                email: "a@example.com".to_string(),
                full_name: "A".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Student,
                status: AccountStatus::Approved,
            })
            .await
            .unwrap();
        refresh_rankings(&store, ScoringPolicy::current()).await.unwrap();
        assert!(stored_ranking(&store, user.id).await.is_some());

        store.failing_ranking_reads.store(1, Ordering::SeqCst);
        assert!(stored_ranking(&store, user.id).await.is_none());
        assert!(stored_ranking(&store, user.id).await.is_some());
    }
}
