//! src/services/user_service.rs
//!
//! UserService — create, read, update and delete users. Every read computes
//! `tasks_count` from the `tasks` table so callers never see a stale count.

use super::{
    ServiceError, ServiceResult, is_unique_violation,
    pagination::{self, Page, PageSelector},
    validation::{self, DUPLICATE_EMAIL, FieldErrors},
};
use crate::models::user::User;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

const USER_SELECT: &str = "SELECT u.id, u.name, u.email, \
     (SELECT COUNT(*) FROM tasks t WHERE t.user_id = u.id) AS tasks_count, \
     u.created_at, u.updated_at \
     FROM users u";

const USER_ORDER: &str = " ORDER BY u.created_at DESC, u.id DESC";

/// Fields to change on an existing user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A validated, not yet stored user. Only `check_new_user` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    email: String,
}

#[derive(Clone)]
pub struct UserService {
    pub db: Arc<SqlitePool>,
}

impl UserService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create a user after trimming and validating `name` and `email`.
    ///
    /// A taken email is reported as a field error on `email`.
    pub async fn create_user(&self, name: &str, email: &str) -> ServiceResult<User> {
        let mut errors = FieldErrors::default();
        match self.check_new_user(Some(name), Some(email), &mut errors).await? {
            Some(new) => self.insert_user(new).await,
            None => Err(ServiceError::Validation(errors)),
        }
    }

    /// Clean whichever fields of a new user were supplied into `errors`.
    ///
    /// Returns the cleaned user only when both fields are present and
    /// `errors` is still empty, so presence errors recorded by the caller
    /// are reported together with these.
    pub async fn check_new_user(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        errors: &mut FieldErrors,
    ) -> ServiceResult<Option<NewUser>> {
        let name = name.and_then(|raw| validation::clean_name(raw, errors));
        let email = email.and_then(|raw| validation::clean_email(raw, errors));
        if let Some(email) = &email {
            if self.email_taken(email, None).await? {
                errors.add("email", DUPLICATE_EMAIL);
            }
        }

        Ok(match (name, email) {
            (Some(name), Some(email)) if errors.is_empty() => Some(NewUser { name, email }),
            _ => None,
        })
    }

    /// Store a user produced by `check_new_user`.
    pub async fn insert_user(&self, new: NewUser) -> ServiceResult<User> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (name, email, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                duplicate_email()
            } else {
                ServiceError::Sqlx(err)
            }
        })?;

        let user = self.fetch_user(id).await?;
        info!(user_id = user.id, "created user {}", user);
        Ok(user)
    }

    /// Look up a single user. `None` when no such id exists.
    pub async fn get_user_by_id(&self, user_id: i64) -> ServiceResult<Option<User>> {
        let sql = format!("{USER_SELECT} WHERE u.id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(user)
    }

    /// All users, newest first.
    pub async fn get_all_users(&self) -> ServiceResult<Vec<User>> {
        let sql = format!("{USER_SELECT}{USER_ORDER}");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&*self.db)
            .await?;
        Ok(users)
    }

    /// One page of users, newest first.
    pub async fn list_users_page(
        &self,
        selector: PageSelector,
        page_size: u32,
    ) -> ServiceResult<Page<User>> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&*self.db)
            .await?;
        let window = pagination::window(selector, count, page_size)?;

        let sql = format!("{USER_SELECT}{USER_ORDER} LIMIT ? OFFSET ?");
        let items = sqlx::query_as::<_, User>(&sql)
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

    /// Apply a partial update. Payload errors are reported before a missing id.
    pub async fn update_user(&self, user_id: i64, changes: UserChanges) -> ServiceResult<User> {
        let mut errors = FieldErrors::default();
        let name = changes
            .name
            .as_deref()
            .map(|raw| validation::clean_name(raw, &mut errors));
        let email = changes
            .email
            .as_deref()
            .map(|raw| validation::clean_email(raw, &mut errors));
        errors.into_result()?;

        let current = self
            .get_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        let name = name.flatten().unwrap_or(current.name);
        let email = email.flatten().unwrap_or(current.email);

        if self.email_taken(&email, Some(user_id)).await? {
            return Err(duplicate_email());
        }

        sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&email)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&*self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    duplicate_email()
                } else {
                    ServiceError::Sqlx(err)
                }
            })?;

        let user = self.fetch_user(user_id).await?;
        debug!(user_id, "updated user {}", user);
        Ok(user)
    }

    /// Delete a user and, through the foreign key, all of their tasks.
    ///
    /// Returns `false` when the user did not exist.
    pub async fn delete_user(&self, user_id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&*self.db)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(user_id, "deleted user");
        }
        Ok(deleted)
    }

    /// Existence check used by the task service for owner validation.
    pub async fn exists(&self, user_id: i64) -> ServiceResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&*self.db)
            .await?;
        Ok(found > 0)
    }

    async fn fetch_user(&self, user_id: i64) -> ServiceResult<User> {
        self.get_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> ServiceResult<bool> {
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id IS NOT ?",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&*self.db)
        .await?;
        Ok(taken > 0)
    }
}

fn duplicate_email() -> ServiceError {
    ServiceError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn service() -> UserService {
        UserService::new(Arc::new(test_pool().await))
    }

    #[tokio::test]
    async fn create_user_trims_and_stores() {
        let users = service().await;
        let user = users.create_user("  Alice ", "alice@example.com").await.unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.tasks_count, 0);
        assert_eq!(user.to_string(), "Alice (alice@example.com)");
        assert_eq!(users.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_must_be_unique() {
        let users = service().await;
        users.create_user("Test User", "test@example.com").await.unwrap();

        let err = users
            .create_user("Another User", "test@example.com")
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(fields) => {
                assert_eq!(fields.get("email"), Some(&[DUPLICATE_EMAIL.to_string()][..]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn check_new_user_reports_every_supplied_field() {
        let users = service().await;
        users.create_user("Test User", "test@example.com").await.unwrap();

        let mut errors = FieldErrors::default();
        errors.add("name", validation::REQUIRED);
        let new = users
            .check_new_user(None, Some(" test@example.com "), &mut errors)
            .await
            .unwrap();
        assert_eq!(new, None);
        assert_eq!(errors.get("name"), Some(&[validation::REQUIRED.to_string()][..]));
        assert_eq!(errors.get("email"), Some(&[DUPLICATE_EMAIL.to_string()][..]));
    }

    #[tokio::test]
    async fn get_user_by_id_missing_is_none() {
        let users = service().await;
        assert!(users.get_user_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn users_are_listed_newest_first() {
        let users = service().await;
        for i in 1..=3 {
            users
                .create_user(&format!("User {i}"), &format!("user{i}@example.com"))
                .await
                .unwrap();
        }

        let names: Vec<String> = users
            .get_all_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["User 3", "User 2", "User 1"]);
    }

    #[tokio::test]
    async fn update_user_applies_only_present_fields() {
        let users = service().await;
        let user = users.create_user("Test User", "test@example.com").await.unwrap();

        let updated = users
            .update_user(
                user.id,
                UserChanges {
                    name: Some("Updated Name".into()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Updated Name");
        assert_eq!(updated.email, "test@example.com");
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn update_user_keeping_own_email_is_allowed() {
        let users = service().await;
        let user = users.create_user("Test User", "test@example.com").await.unwrap();

        let updated = users
            .update_user(
                user.id,
                UserChanges {
                    name: None,
                    email: Some("test@example.com".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "test@example.com");
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let users = service().await;
        let err = users
            .update_user(9999, UserChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound(9999)));
    }

    #[tokio::test]
    async fn delete_user_reports_whether_it_existed() {
        let users = service().await;
        let user = users.create_user("Test User", "test@example.com").await.unwrap();

        assert!(users.delete_user(user.id).await.unwrap());
        assert!(users.get_user_by_id(user.id).await.unwrap().is_none());
        assert!(!users.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn pages_split_the_user_list() {
        let users = service().await;
        for i in 1..=5 {
            users
                .create_user(&format!("User {i}"), &format!("user{i}@example.com"))
                .await
                .unwrap();
        }

        let first = users.list_users_page(PageSelector::Number(1), 2).await.unwrap();
        assert_eq!(first.count, 5);
        assert_eq!(first.num_pages, 3);
        assert_eq!(first.items.len(), 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let last = users.list_users_page(PageSelector::Last, 2).await.unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].name, "User 1");
    }
}
