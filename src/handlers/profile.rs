// src/handlers/profile.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        activity::{ActivityListParams, ActivityLog},
        certification::Certification,
        user::MeResponse,
    },
    state::AppState,
    utils::jwt::CurrentUser,
};

const RECENT_ACTIVITY_ON_PROFILE: i64 = 5;

/// Get current user's profile and statistics.
#[utoipa::path(
    get,
    path = "/api/profile/me",
    tag = "profile",
    security(("bearer" = [])),
    responses((status = 200, body = MeResponse))
)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let ranking = state.store.get_ranking(user.id).await?;
    let certifications_count = state.store.list_certifications(Some(user.id)).await?.len();
    let recent_activity = state
        .store
        .list_activity(user.id, RECENT_ACTIVITY_ON_PROFILE)
        .await?;

    Ok(Json(MeResponse {
        user,
        ranking,
        certifications_count,
        recent_activity,
    }))
}

/// Activity history of the current user, newest first.
#[utoipa::path(
    get,
    path = "/api/profile/activity",
    tag = "profile",
    security(("bearer" = [])),
    params(("limit" = Option<i64>, Query, description = "Max entries (default 20, max 100)")),
    responses((status = 200, body = Vec<ActivityLog>))
)]
pub async fn list_my_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ActivityListParams>,
) -> Result<impl IntoResponse, AppError> {
    let activity = state.store.list_activity(user.id, params.limit()).await?;
    Ok(Json(activity))
}

/// Certificates earned by the current user, newest first.
#[utoipa::path(
    get,
    path = "/api/profile/certifications",
    tag = "profile",
    security(("bearer" = [])),
    responses((status = 200, body = Vec<Certification>))
)]
pub async fn list_my_certifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let certifications = state.store.list_certifications(Some(user.id)).await?;
    Ok(Json(certifications))
}
