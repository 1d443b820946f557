//! HTTP handlers for `/api/users/`.

use super::{ApiJson, ApiQuery, PageQuery, PageResponse, page_url, parse_id};
use crate::{
    errors::AppError,
    models::{task::Task, user::User},
    services::{
        user_service::UserChanges,
        validation::{Field, FieldErrors},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

const USER_NOT_FOUND: &str = "User not found";
const USERS_PATH: &str = "/api/users/";

/// Body accepted by create and update.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Field<String>,
    #[serde(default)]
    pub email: Field<String>,
}

/// GET `/api/users/` — paginated, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> Result<Json<PageResponse<User>>, AppError> {
    let page = state
        .users
        .list_users_page(q.selector()?, state.page_size)
        .await?;
    Ok(Json(PageResponse::from_page(page, &page_url(&headers, USERS_PATH))))
}

/// POST `/api/users/`
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut errors = FieldErrors::default();
    let name = payload.name.required("name", &mut errors);
    let email = payload.email.required("email", &mut errors);
    let Some(new) = state
        .users
        .check_new_user(name.as_deref(), email.as_deref(), &mut errors)
        .await?
    else {
        return Err(AppError::validation(errors));
    };

    let user = state.users.insert_user(new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET `/api/users/{id}/`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state
        .users
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    Ok(Json(user))
}

/// PUT/PATCH `/api/users/{id}/` — both are partial updates.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    let mut errors = FieldErrors::default();
    let changes = UserChanges {
        name: payload.name.optional("name", &mut errors),
        email: payload.email.optional("email", &mut errors),
    };
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    let user = state.users.update_user(id, changes).await?;
    Ok(Json(user))
}

/// DELETE `/api/users/{id}/` — also removes the user's tasks.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    if !state.users.delete_user(id).await? {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/users/{id}/tasks/` — unpaginated; unknown users yield `[]`.
pub async fn list_user_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let tasks = state.tasks.get_tasks_by_user(id).await?;
    Ok(Json(tasks))
}
