//! HTTP handlers for `/api/tasks/`.

use super::{ApiJson, ApiQuery, PageQuery, PageResponse, page_url, parse_id};
use crate::{
    errors::AppError,
    models::task::Task,
    services::{
        task_service::TaskChanges,
        validation::{Field, FieldErrors, PkValue},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

const TASK_NOT_FOUND: &str = "Task not found";
const TASKS_PATH: &str = "/api/tasks/";

/// Body for POST `/api/tasks/`. `is_completed` is not accepted on create.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskPayload {
    #[serde(default)]
    pub title: Field<String>,
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub user: Field<PkValue>,
}

/// Body for PUT/PATCH `/api/tasks/{id}/`. The owner cannot be changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskPayload {
    #[serde(default)]
    pub title: Field<String>,
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub is_completed: Field<bool>,
}

/// `?user_id=` filter for the completed/pending views.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerFilter {
    pub user_id: Option<String>,
}

impl OwnerFilter {
    fn user_id(&self) -> Result<Option<i64>, AppError> {
        match self.user_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::bad_request("user_id must be an integer")),
        }
    }
}

/// GET `/api/tasks/` — paginated, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<Json<PageResponse<Task>>, AppError> {
    let page = state
        .tasks
        .list_tasks_page(q.selector()?, state.page_size)
        .await?;
    Ok(Json(PageResponse::from_page(page, &page_url(&headers, TASKS_PATH))))
}

/// POST `/api/tasks/`
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTaskPayload>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let mut errors = FieldErrors::default();
    let title = payload.title.required("title", &mut errors);
    let user_id = payload
        .user
        .required("user", &mut errors)
        .and_then(|pk| pk.resolve("user", &mut errors));
    // Omitted description is stored as "", an explicit null as NULL.
    let description = payload.description.nullable().unwrap_or(Some(String::new()));

    let Some(new) = state
        .tasks
        .check_new_task(title.as_deref(), user_id, description, &mut errors)
        .await?
    else {
        return Err(AppError::validation(errors));
    };

    let task = state.tasks.insert_task(new).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET `/api/tasks/{id}/`
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    let task = state
        .tasks
        .get_task_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(TASK_NOT_FOUND))?;
    Ok(Json(task))
}

/// PUT/PATCH `/api/tasks/{id}/` — both are partial updates.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateTaskPayload>,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;

    let mut errors = FieldErrors::default();
    let changes = TaskChanges {
        title: payload.title.optional("title", &mut errors),
        description: payload.description.nullable(),
        is_completed: payload.is_completed.optional("is_completed", &mut errors),
    };
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let task = state.tasks.update_task(id, changes).await?;
    Ok(Json(task))
}

/// DELETE `/api/tasks/{id}/`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    if !state.tasks.delete_task(id).await? {
        return Err(AppError::not_found(TASK_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/tasks/{id}/toggle_completion/` — body is ignored.
pub async fn toggle_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = parse_id(&id, TASK_NOT_FOUND)?;
    let task = state.tasks.toggle_task_completion(id).await?;
    Ok(Json(task))
}

/// GET `/api/tasks/completed/?user_id=`
pub async fn completed_tasks(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OwnerFilter>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.get_completed_tasks(filter.user_id()?).await?;
    Ok(Json(tasks))
}

/// GET `/api/tasks/pending/?user_id=`
pub async fn pending_tasks(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OwnerFilter>,
) -> Result<Json<Vec<Task>>, AppError> {
    let tasks = state.tasks.get_pending_tasks(filter.user_id()?).await?;
    Ok(Json(tasks))
}
