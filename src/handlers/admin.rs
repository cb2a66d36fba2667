// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    content::sample_text,
    error::AppError,
    generation::{GenerateTextRequest, GeneratedText, TextSource},
    models::{
        admin::{AdminOverview, RefreshSummary, UserAnalytics},
        lesson::{
            CreateLessonRequest, Lesson, LessonChanges, LessonListParams, ModuleType, NewLesson,
            SampleTextParams, SampleTextResponse, UpdateLessonRequest,
        },
        user::{AccountStatus, Role, UpdateStatusRequest, User, UserListParams},
    },
    scoring::refresh_rankings,
    state::AppState,
    utils::{jwt::CurrentUser, sanitize::plain_text},
};

const ANALYTICS_ACTIVITY_LIMIT: i64 = 50;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Counts for the dashboard header.
#[utoipa::path(
    get,
    path = "/api/admin/overview",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, body = AdminOverview))
)]
pub async fn get_overview(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let students = state.store.list_users(Some(Role::Student), None).await?;
    let count_status =
        |status: AccountStatus| students.iter().filter(|u| u.status == status).count();

    let rankings = state.store.list_rankings().await?;
    let active: Vec<_> = rankings.iter().filter(|r| r.total_lessons_completed > 0).collect();
    let (average_wpm, average_accuracy) = if active.is_empty() {
        (0.0, 0.0)
    } else {
        let n = active.len() as f64;
        (
            round_one_decimal(active.iter().map(|r| r.average_wpm).sum::<f64>() / n),
            round_one_decimal(active.iter().map(|r| r.average_accuracy).sum::<f64>() / n),
        )
    };

    Ok(Json(AdminOverview {
        total_students: students.len(),
        pending_students: count_status(AccountStatus::Pending),
        approved_students: count_status(AccountStatus::Approved),
        denied_students: count_status(AccountStatus::Denied),
        total_lessons: state.store.list_lessons(None).await?.len(),
        total_sessions: state.store.count_activity().await?,
        certifications_issued: state.store.list_certifications(None).await?.len(),
        average_wpm,
        average_accuracy,
    }))
}

/// Lists users, oldest registration first. Filters by role and status.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("role" = Option<Role>, Query, description = "student or admin"),
        ("status" = Option<AccountStatus>, Query, description = "pending, approved or denied"),
    ),
    responses((status = 200, body = Vec<User>))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users(params.role, params.status).await?;
    Ok(Json(users))
}

/// Approves or denies a student account.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/status",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, body = User),
        (status = 400, description = "Target is an admin account"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn update_user_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = state.store.get_user(id).await?;
    if target.role == Role::Admin {
        return Err(AppError::BadRequest(
            "Admin accounts are not subject to review".to_string(),
        ));
    }

    let user = state.store.set_user_status(id, payload.status).await?;
    tracing::info!("User {} status set to {}", user.id, user.status.as_str());

    // Approval changes who is ranked.
    if target.status != user.status {
        refresh_rankings(state.store.as_ref(), state.policy).await?;
    }

    Ok(Json(user))
}

/// Deletes a user and everything they own. Prevents deleting self.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == admin.id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    state.store.delete_user(id).await?;
    tracing::info!("User {} deleted by admin {}", id, admin.id);

    refresh_rankings(state.store.as_ref(), state.policy).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Full history of one user.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/analytics",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, body = UserAnalytics),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user_analytics(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.store.get_user(id).await?;

    Ok(Json(UserAnalytics {
        ranking: state.store.get_ranking(id).await?,
        progress: state.store.list_progress(Some(id)).await?,
        assessments: state.store.list_assessments(id).await?,
        recent_activity: state.store.list_activity(id, ANALYTICS_ACTIVITY_LIMIT).await?,
        certifications: state.store.list_certifications(Some(id)).await?,
        user,
    }))
}

/// All lessons, newest first, optionally filtered by exact level.
#[utoipa::path(
    get,
    path = "/api/admin/lessons",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("level" = Option<String>, Query, description = "beginner, intermediate, advanced or all"),
    ),
    responses((status = 200, body = Vec<Lesson>))
)]
pub async fn list_lessons(
    State(state): State<AppState>,
    Query(params): Query<LessonListParams>,
) -> Result<impl IntoResponse, AppError> {
    let lessons = state.store.list_lessons(params.level).await?;
    Ok(Json(lessons))
}

#[utoipa::path(
    post,
    path = "/api/admin/lessons",
    tag = "admin",
    security(("bearer" = [])),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, body = Lesson),
        (status = 400, description = "Validation failed"),
    )
)]
pub async fn create_lesson(
    State(state): State<AppState>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let title = plain_text(&payload.title);
    if title.is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Content must not be blank".to_string()));
    }

    let lesson = state
        .store
        .create_lesson(NewLesson {
            title,
            content: payload.content,
            level: payload.level,
            module_type: payload.module_type,
            audio_url: payload.audio_url,
        })
        .await?;

    tracing::info!("Lesson {} created ({}, {})", lesson.id, lesson.level, lesson.module_type);

    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Partial update. Changing the text of a lesson that already has
/// recorded sessions is rejected with 409.
#[utoipa::path(
    put,
    path = "/api/admin/lessons/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, body = Lesson),
        (status = 404, description = "Lesson not found"),
        (status = 409, description = "Content is referenced by stored sessions"),
    )
)]
pub async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let current = state.store.get_lesson(id).await?;

    let title = payload.title.as_deref().map(plain_text);
    if title.as_deref() == Some("") {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }

    // Unchanged text is not an edit.
    let content = payload.content.filter(|c| *c != current.content);
    if content.is_some() && state.store.lesson_has_progress(id).await? {
        return Err(AppError::Conflict(
            "Lesson text cannot change after students have practised \
             it; create a new lesson instead"
                .to_string(),
        ));
    }

    let changes = LessonChanges {
        title,
        content,
        level: payload.level,
        module_type: payload.module_type,
        audio_url: payload.audio_url,
    };

    let level_changed = changes.level.is_some_and(|level| level != current.level);
    let lesson = state.store.update_lesson(id, changes).await?;

    // Points depend on the lesson level.
    if level_changed {
        refresh_rankings(state.store.as_ref(), state.policy).await?;
    }

    Ok(Json(lesson))
}

/// Deletes a lesson. Its progress rows go with it; activity history stays.
#[utoipa::path(
    delete,
    path = "/api/admin/lessons/{id}",
    tag = "admin",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Lesson not found"),
    )
)]
pub async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let had_progress = state.store.lesson_has_progress(id).await?;
    state.store.delete_lesson(id).await?;
    tracing::info!("Lesson {} deleted", id);

    if had_progress {
        refresh_rankings(state.store.as_ref(), state.policy).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// A built-in sample text to start a lesson from.
#[utoipa::path(
    get,
    path = "/api/admin/lessons/sample",
    tag = "admin",
    security(("bearer" = [])),
    params(
        ("level" = String, Query, description = "beginner, intermediate, advanced or all"),
        ("module_type" = Option<String>, Query,
            description = "text (default), audio_sentence or audio_paragraph"),
        ("index" = Option<usize>, Query, description = "Sample index, wraps around"),
    ),
    responses((status = 200, body = SampleTextResponse))
)]
pub async fn get_sample_text(Query(params): Query<SampleTextParams>) -> Json<SampleTextResponse> {
    let module_type = params.module_type.unwrap_or(ModuleType::Text);
    let content = sample_text(params.level, module_type, params.index.unwrap_or(0));

    Json(SampleTextResponse {
        level: params.level,
        module_type,
        content: content.to_string(),
    })
}

/// Drafts a lesson passage with the text generator. Falls back to a
/// built-in sample when the generator is unconfigured or fails.
#[utoipa::path(
    post,
    path = "/api/admin/lessons/generate",
    tag = "admin",
    security(("bearer" = [])),
    request_body = GenerateTextRequest,
    responses((status = 200, body = GeneratedText))
)]
pub async fn generate_text(
    State(state): State<AppState>,
    Json(payload): Json<GenerateTextRequest>,
) -> Json<GeneratedText> {
    let (content, source) = match state.generator.generate(payload.level).await {
        Ok(text) => (text, TextSource::Generated),
        Err(e) => {
            tracing::warn!("Text generation failed, using a sample: {}", e);
            let index = payload.index.unwrap_or(0);
            let sample = sample_text(payload.level, ModuleType::Text, index);
            (sample.to_string(), TextSource::Sample)
        }
    };

    Json(GeneratedText {
        level: payload.level,
        content,
        source,
    })
}

/// Recomputes rankings and issues any due certificates.
#[utoipa::path(
    post,
    path = "/api/admin/rankings/refresh",
    tag = "admin",
    security(("bearer" = [])),
    responses((status = 200, body = RefreshSummary))
)]
pub async fn refresh(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let outcome = refresh_rankings(state.store.as_ref(), state.policy).await?;
    tracing::info!(
        "Manual ranking refresh: {} ranked, {} certificates",
        outcome.rankings.len(),
        outcome.issued.len()
    );

    Ok(Json(RefreshSummary {
        students_ranked: outcome.rankings.len(),
        certificates_issued: outcome.issued,
    }))
}
