use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::Json as JsonBody,
    state::AppState,
};

use super::dto::{parse_task_id, validate_title, CreateTaskRequest, UpdateTaskRequest};
use super::repo_types::Task;

const TASK_NOT_FOUND: &str = "Task not found";

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/:id", get(get_task).put(update_task).delete(delete_task))
}

#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = validate_title(&body.title)?;
    let task = state.tasks.create(user_id, title, body.completed).await?;
    info!(task_id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list(user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    state
        .tasks
        .get(user_id, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let title = validate_title(&body.title)?;
    state
        .tasks
        .update(user_id, id, title, body.completed)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_task_id(&id)?;
    let task = state
        .tasks
        .delete(user_id, id)
        .await?
        .ok_or(ApiError::NotFound(TASK_NOT_FOUND))?;
    info!(task_id = task.id, "task deleted");
    Ok(Json(task))
}
