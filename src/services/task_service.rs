//! src/services/task_service.rs
//!
//! TaskService — tasks are always read joined with their owner so the API can
//! return `user_name` / `user_email` without a second round-trip.

use super::{
    ServiceError, ServiceResult, is_foreign_key_violation,
    pagination::{self, Page, PageSelector},
    user_service::UserService,
    validation::{self, FieldErrors},
};
use crate::models::task::Task;
use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.is_completed, t.user_id, \
     u.name AS user_name, u.email AS user_email, t.created_at, t.updated_at \
     FROM tasks t JOIN users u ON u.id = t.user_id";

const TASK_ORDER: &str = " ORDER BY t.created_at DESC, t.id DESC";

/// Fields to change on an existing task. The owner is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
}

/// A validated, not yet stored task. Only `check_new_task` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    user_id: i64,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TaskService {
    pub db: Arc<SqlitePool>,
    users: UserService,
}

impl TaskService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self {
            users: UserService::new(db.clone()),
            db,
        }
    }

    /// Create an open task owned by `user_id`.
    ///
    /// An unknown owner is a field error on `user`, reported together with
    /// any title error.
    pub async fn create_task(
        &self,
        title: &str,
        user_id: i64,
        description: Option<&str>,
    ) -> ServiceResult<Task> {
        let mut errors = FieldErrors::default();
        let description = description.map(str::to_string);
        match self
            .check_new_task(Some(title), Some(user_id), description, &mut errors)
            .await?
        {
            Some(new) => self.insert_task(new).await,
            None => Err(ServiceError::Validation(errors)),
        }
    }

    /// Clean the supplied title and check the supplied owner into `errors`.
    ///
    /// Returns the task to insert only when title and owner are present and
    /// `errors` is still empty.
    pub async fn check_new_task(
        &self,
        title: Option<&str>,
        user_id: Option<i64>,
        description: Option<String>,
        errors: &mut FieldErrors,
    ) -> ServiceResult<Option<NewTask>> {
        let title = title.and_then(|raw| validation::clean_title(raw, errors));
        if let Some(user_id) = user_id {
            if !self.users.exists(user_id).await? {
                errors.add("user", validation::invalid_pk(user_id));
            }
        }

        Ok(match (title, user_id) {
            (Some(title), Some(user_id)) if errors.is_empty() => Some(NewTask {
                title,
                user_id,
                description,
            }),
            _ => None,
        })
    }

    /// Store a task produced by `check_new_task`.
    ///
    /// An owner deleted since the check is reported like an unknown owner.
    pub async fn insert_task(&self, new: NewTask) -> ServiceResult<Task> {
        let user_id = new.user_id;
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO tasks (title, description, is_completed, user_id, created_at, updated_at)
             VALUES (?, ?, 0, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ServiceError::Validation(FieldErrors::single(
                    "user",
                    validation::invalid_pk(user_id),
                ))
            } else {
                ServiceError::Sqlx(err)
            }
        })?;

        let task = self.fetch_task(id).await?;
        info!(task_id = task.id, user_id, "created task {}", task);
        Ok(task)
    }

    pub async fn get_task_by_id(&self, task_id: i64) -> ServiceResult<Option<Task>> {
        let sql = format!("{TASK_SELECT} WHERE t.id = ?");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(task)
    }

    /// Tasks owned by `user_id`, newest first. Unknown users own nothing.
    pub async fn get_tasks_by_user(&self, user_id: i64) -> ServiceResult<Vec<Task>> {
        let sql = format!("{TASK_SELECT} WHERE t.user_id = ?{TASK_ORDER}");
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&*self.db)
            .await?;
        Ok(tasks)
    }

    pub async fn get_all_tasks(&self) -> ServiceResult<Vec<Task>> {
        let sql = format!("{TASK_SELECT}{TASK_ORDER}");
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .fetch_all(&*self.db)
            .await?;
        Ok(tasks)
    }

    pub async fn list_tasks_page(
        &self,
        selector: PageSelector,
        page_size: u32,
    ) -> ServiceResult<Page<Task>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
            .fetch_one(&*self.db)
            .await?;
        let window = pagination::window(selector, count, page_size)?;

        let sql = format!("{TASK_SELECT}{TASK_ORDER} LIMIT ? OFFSET ?");
        let items = sqlx::query_as::<_, Task>(&sql)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&*self.db)
            .await?;

        Ok(Page {
            items,
            count,
            number: window.number,
            num_pages: window.num_pages,
        })
    }

    /// Apply a partial update to title, description and completion state.
    pub async fn update_task(&self, task_id: i64, changes: TaskChanges) -> ServiceResult<Task> {
        let mut errors = FieldErrors::default();
        let title = changes
            .title
            .as_deref()
            .map(|raw| validation::clean_title(raw, &mut errors));
        errors.into_result()?;

        let current = self.fetch_task(task_id).await?;
        let title = title.flatten().unwrap_or(current.title);
        let description = changes.description.unwrap_or(current.description);
        let is_completed = changes.is_completed.unwrap_or(current.is_completed);

        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, is_completed = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&title)
        .bind(description)
        .bind(is_completed)
        .bind(Utc::now())
        .bind(task_id)
        .execute(&*self.db)
        .await?;

        let task = self.fetch_task(task_id).await?;
        debug!(task_id, "updated task {}", task);
        Ok(task)
    }

    /// Flip `is_completed` in a single statement.
    pub async fn toggle_task_completion(&self, task_id: i64) -> ServiceResult<Task> {
        let result = sqlx::query(
            "UPDATE tasks SET is_completed = NOT is_completed, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(task_id)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::TaskNotFound(task_id));
        }

        let task = self.fetch_task(task_id).await?;
        debug!(task_id, is_completed = task.is_completed, "toggled task");
        Ok(task)
    }

    /// Returns `false` when the task did not exist.
    pub async fn delete_task(&self, task_id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&*self.db)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(task_id, "deleted task");
        }
        Ok(deleted)
    }

    /// Completed tasks, optionally only those owned by `user_id`.
    pub async fn get_completed_tasks(&self, user_id: Option<i64>) -> ServiceResult<Vec<Task>> {
        self.tasks_with_status(true, user_id).await
    }

    /// Open tasks, optionally only those owned by `user_id`.
    pub async fn get_pending_tasks(&self, user_id: Option<i64>) -> ServiceResult<Vec<Task>> {
        self.tasks_with_status(false, user_id).await
    }

    async fn tasks_with_status(
        &self,
        is_completed: bool,
        user_id: Option<i64>,
    ) -> ServiceResult<Vec<Task>> {
        let mut builder = QueryBuilder::<Sqlite>::new(TASK_SELECT);
        builder.push(" WHERE t.is_completed = ");
        builder.push_bind(is_completed);

        if let Some(user_id) = user_id {
            builder.push(" AND t.user_id = ");
            builder.push_bind(user_id);
        }

        builder.push(TASK_ORDER);

        let tasks: Vec<Task> = builder.build_query_as().fetch_all(&*self.db).await?;
        Ok(tasks)
    }

    async fn fetch_task(&self, task_id: i64) -> ServiceResult<Task> {
        self.get_task_by_id(task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(task_id))
    }
}
