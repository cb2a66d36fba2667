// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    handlers::{admin, assessment, auth, lessons, profile, rankings, speech},
    openapi::ApiDoc,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
];

fn cors_layer(config: &Config) -> CorsLayer {
    let configured: Vec<&str> = if config.cors_origins.is_empty() {
        DEFAULT_ORIGINS.to_vec()
    } else {
        config.cors_origins.iter().map(String::as_str).collect()
    };

    let origins: Vec<HeaderValue> = configured
        .into_iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public: auth (rate limited), OpenAPI document and Swagger UI.
/// * Authenticated: assessments, lessons, rankings, profile.
/// * Admin: user review, lesson authoring, analytics, speech helpers.
///
/// The auth rate limiter keys on the peer address, so the service must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let auth_routes = match GovernorConfigBuilder::default()
        .per_second(state.config.auth_replenish_seconds)
        .burst_size(state.config.auth_burst_size)
        .finish()
    {
        Some(governor_conf) => auth_routes.layer(GovernorLayer::new(Arc::new(governor_conf))),
        None => {
            tracing::warn!("Invalid auth rate limit settings; auth routes are not rate limited");
            auth_routes
        }
    };

    let student_routes = Router::new()
        .route("/assessments/passage", get(assessment::get_passage))
        .route("/assessments", post(assessment::submit_assessment))
        .route("/lessons", get(lessons::list_lessons))
        .route("/lessons/{id}", get(lessons::get_lesson))
        .route("/lessons/{id}/sessions", post(lessons::submit_session))
        .route("/rankings/leaderboard", get(rankings::get_leaderboard))
        .route("/rankings/me", get(rankings::get_my_ranking))
        .route("/profile/me", get(profile::get_me))
        .route("/profile/activity", get(profile::list_my_activity))
        .route("/profile/certifications", get(profile::list_my_certifications))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/overview", get(admin::get_overview))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/users/{id}/status", put(admin::update_user_status))
        .route("/users/{id}/analytics", get(admin::get_user_analytics))
        .route("/lessons", get(admin::list_lessons).post(admin::create_lesson))
        .route("/lessons/sample", get(admin::get_sample_text))
        .route("/lessons/generate", post(admin::generate_text))
        .route(
            "/lessons/{id}",
            put(admin::update_lesson).delete(admin::delete_lesson),
        )
        .route("/rankings/refresh", post(admin::refresh))
        .route(
            "/speech/transcribe",
            post(speech::transcribe).layer(DefaultBodyLimit::max(speech::MAX_AUDIO_BYTES)),
        )
        .route("/speech/synthesize", post(speech::synthesize))
        // Auth first, then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .merge(student_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
