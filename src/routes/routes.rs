//! Defines routes for the user and task API.
//!
//! ## Structure
//! - **User endpoints**
//!   - `GET    /api/users/` — paginated list
//!   - `POST   /api/users/` — create user
//!   - `GET    /api/users/{id}/` — retrieve
//!   - `PUT    /api/users/{id}/`, `PATCH` — partial update
//!   - `DELETE /api/users/{id}/` — delete user and their tasks
//!   - `GET    /api/users/{id}/tasks/` — tasks owned by the user
//!
//! - **Task endpoints**
//!   - `GET    /api/tasks/` — paginated list
//!   - `POST   /api/tasks/` — create task
//!   - `GET    /api/tasks/completed/`, `/api/tasks/pending/` — filtered views
//!   - `GET    /api/tasks/{id}/` — retrieve
//!   - `PUT    /api/tasks/{id}/`, `PATCH` — partial update
//!   - `DELETE /api/tasks/{id}/` — delete
//!   - `POST   /api/tasks/{id}/toggle_completion/` — flip completion
//!
//! Static segments (`completed`, `pending`) take priority over `{id}`.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        task_handlers::{
            completed_tasks, create_task, delete_task, get_task, list_tasks, pending_tasks,
            toggle_completion, update_task,
        },
        user_handlers::{
            create_user, delete_user, get_user, list_user_tasks, list_users, update_user,
        },
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all API routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // User routes
        .route("/api/users/", get(list_users).post(create_user))
        .route(
            "/api/users/{id}/",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/users/{id}/tasks/", get(list_user_tasks))
        // Task routes
        .route("/api/tasks/", get(list_tasks).post(create_task))
        .route("/api/tasks/completed/", get(completed_tasks))
        .route("/api/tasks/pending/", get(pending_tasks))
        .route(
            "/api/tasks/{id}/",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle_completion/", post(toggle_completion))
}
