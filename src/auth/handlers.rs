use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, ProtectedResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        services,
    },
    error::ApiError,
    extract::Json as JsonBody,
    state::AppState,
};

const USER_NOT_FOUND: &str = "User not found";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/test", get(protected_check))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/email/:email", get(get_user_by_email))
        .route("/users/id/:id", get(get_user_by_id))
        .route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let user = services::register(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = services::login(state.users.as_ref(), &state.tokens, payload).await?;
    Ok(Json(LoginResponse { token }))
}

#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn protected_check(AuthUser(user_id): AuthUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "protected route accessed successfully",
        user_id,
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, email))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::validation("Invalid user id"))?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    Ok(Json(user.into()))
}
