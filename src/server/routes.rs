//! Task route handlers.
//!
//! Each handler validates its input, runs one database operation and wraps
//! the result in an [`Envelope`].

use super::AppState;
use super::envelope::{ApiFailure, Envelope};
use crate::error::ServiceError;
use crate::types::{StatusPatch, Task, TaskFilters, TaskPayload, TaskStats};
use crate::validation::{validate_status, validate_task_payload};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::{debug, info};

type ApiResult<T> = Result<T, ApiFailure>;

/// Parse a `{id}` path segment; only positive integers are valid ids.
pub fn parse_task_id(raw: &str) -> Result<i64, ServiceError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ServiceError::invalid_id(raw)),
    }
}

/// Turn a JSON body rejection into an `INVALID_INPUT` envelope.
fn body<T>(state: &AppState, payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| {
            state.reject(ServiceError::InvalidInput(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        })
}

/// `GET /tasks?status=&search=`
///
/// Query parameters are read as raw pairs so repeated or unknown keys never
/// reject the request.
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Envelope<Vec<Task>>>> {
    let Query(pairs) = query.map_err(|rejection| {
        state.reject(ServiceError::InvalidInput(format!(
            "Invalid query string: {}",
            rejection.body_text()
        )))
    })?;
    let filters = TaskFilters::from_pairs(pairs);
    let tasks = state.db.list_tasks(&filters).map_err(|e| state.reject(e))?;
    debug!(
        status = ?filters.status(),
        search = ?filters.search(),
        count = tasks.len(),
        "Listed tasks"
    );
    Ok(Json(Envelope::list(tasks)))
}

/// `GET /tasks/stats`
pub async fn task_stats(State(state): State<AppState>) -> ApiResult<Json<Envelope<TaskStats>>> {
    let stats = state.db.get_task_stats().map_err(|e| state.reject(e))?;
    Ok(Json(Envelope::ok(stats)))
}

/// `GET /tasks/{id}`
pub async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Envelope<Task>>> {
    let task_id = parse_task_id(&raw_id).map_err(|e| state.reject(e))?;
    let task = state.db.get_task(task_id).map_err(|e| state.reject(e))?;
    Ok(Json(Envelope::ok(task)))
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Task>>)> {
    let input = body(&state, payload)?;
    let valid = validate_task_payload(&input).map_err(|e| state.reject(e))?;
    let task = state.db.create_task(&valid).map_err(|e| state.reject(e))?;
    info!(task_id = task.id, status = %task.status, "Task created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(task).with_message("Task created successfully")),
    ))
}

/// `PUT /tasks/{id}`
pub async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> ApiResult<Json<Envelope<Task>>> {
    let task_id = parse_task_id(&raw_id).map_err(|e| state.reject(e))?;
    let input = body(&state, payload)?;
    let valid = validate_task_payload(&input).map_err(|e| state.reject(e))?;
    let task = state
        .db
        .update_task(task_id, &valid)
        .map_err(|e| state.reject(e))?;
    info!(task_id, "Task updated");
    Ok(Json(
        Envelope::ok(task).with_message("Task updated successfully"),
    ))
}

/// `PATCH /tasks/{id}/status`
pub async fn patch_task_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<StatusPatch>, JsonRejection>,
) -> ApiResult<Json<Envelope<Task>>> {
    let task_id = parse_task_id(&raw_id).map_err(|e| state.reject(e))?;
    let patch = body(&state, payload)?;
    let status = validate_status(patch.status.as_deref().unwrap_or_default())
        .map_err(|field| state.reject(ServiceError::Validation(vec![field])))?;
    let task = state
        .db
        .patch_task_status(task_id, status)
        .map_err(|e| state.reject(e))?;
    info!(task_id, status = %status, "Task status changed");
    Ok(Json(
        Envelope::ok(task).with_message("Task status updated successfully"),
    ))
}

/// `DELETE /tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    let task_id = parse_task_id(&raw_id).map_err(|e| state.reject(e))?;
    state.db.delete_task(task_id).map_err(|e| state.reject(e))?;
    info!(task_id, "Task deleted");
    Ok(Json(
        Envelope::ok_empty().with_message("Task deleted successfully"),
    ))
}
