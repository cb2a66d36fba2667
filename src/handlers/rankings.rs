// src/handlers/rankings.rs

use std::collections::{BTreeMap, HashMap};

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        ranking::{
            LeaderboardEntry, LeaderboardParams, LeaderboardResponse, RankingRecord,
            category_label,
        },
        user::Role,
    },
    scoring::refresh_rankings,
    state::AppState,
    utils::jwt::CurrentUser,
};

/// Overall and per-category leaderboards.
///
/// Rankings are recomputed before every read. `limit` caps each list.
#[utoipa::path(
    get,
    path = "/api/rankings/leaderboard",
    tag = "rankings",
    security(("bearer" = [])),
    params(
        ("limit" = Option<usize>, Query, description = "Entries per list (default 50, max 500)"),
    ),
    responses((status = 200, body = LeaderboardResponse))
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit();
    let outcome = refresh_rankings(state.store.as_ref(), state.policy).await?;

    let names: HashMap<i64, String> = state
        .store
        .list_users(Some(Role::Student), None)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name))
        .collect();

    let entry = |record: &RankingRecord| {
        let name = names.get(&record.user_id).cloned().unwrap_or_default();
        LeaderboardEntry::new(record, name)
    };

    let overall = outcome.rankings.iter().take(limit).map(entry).collect();

    // Records are in overall order, which is also category order.
    let mut categories: BTreeMap<String, Vec<LeaderboardEntry>> = BTreeMap::new();
    for record in &outcome.rankings {
        let list = categories
            .entry(category_label(record.rank_category).to_string())
            .or_default();
        if list.len() < limit {
            list.push(entry(record));
        }
    }

    Ok(Json(LeaderboardResponse {
        overall,
        categories,
    }))
}

/// The current student's stored ranking.
#[utoipa::path(
    get,
    path = "/api/rankings/me",
    tag = "rankings",
    security(("bearer" = [])),
    responses(
        (status = 200, body = RankingRecord),
        (status = 404, description = "Not ranked yet"),
    )
)]
pub async fn get_my_ranking(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let ranking = state
        .store
        .get_ranking(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No ranking yet".to_string()))?;

    Ok(Json(ranking))
}
