//! Shared state handed to every handler.

use crate::services::{task_service::TaskService, user_service::UserService};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Shared SQLite connection pool, also used directly by readiness checks.
    pub db: Arc<SqlitePool>,
    pub users: UserService,
    pub tasks: TaskService,
    /// Rows per page on paginated list endpoints.
    pub page_size: u32,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, page_size: u32) -> Self {
        Self {
            users: UserService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            db,
            page_size: page_size.max(1),
        }
    }
}
