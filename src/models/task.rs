//! A unit of work owned by a single user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A task joined with the name and email of its owner.
///
/// `user_name` and `user_email` are read-only copies taken from the `users`
/// table at query time; they cannot be written through a task.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Task {
    pub id: i64,

    /// Non-blank title, stored trimmed.
    pub title: String,

    pub description: Option<String>,

    pub is_completed: bool,

    /// Id of the owning user. Serialized as `user`.
    #[serde(rename = "user")]
    pub user_id: i64,

    pub user_name: String,

    pub user_email: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_completed { "✓" } else { "○" };
        write!(f, "{} {} - {}", status, self.title, self.user_name)
    }
}
