// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        AccountStatus, CreateUserRequest, LoginRequest, LoginResponse, NewUser, Role, User,
    },
    store::DynStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
        sanitize::plain_text,
    },
};

/// Registers a new student account.
///
/// The account starts as `pending` until an admin approves it.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn register(
    State(store): State<DynStore>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    let full_name = plain_text(&payload.full_name);
    if full_name.is_empty() {
        return Err(AppError::BadRequest("Full name must not be empty".to_string()));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!("Email '{}' is already registered", email)));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = store
        .create_user(NewUser {
            email,
            full_name,
            password_hash,
            role: Role::Student,
            status: AccountStatus::Pending,
        })
        .await?;

    tracing::info!("Registered student {} (id {})", user.email, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Pending and denied accounts can still log in; the response carries the
/// status so the client can explain what is blocked.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = store
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        role: user.role,
        status: user.status,
    }))
}
