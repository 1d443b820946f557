//! A person who owns tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A registered user together with the number of tasks they own.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct User {
    /// Auto-assigned row id.
    pub id: i64,

    /// Display name, stored trimmed.
    pub name: String,

    /// Unique email address.
    pub email: String,

    /// Number of tasks owned by this user (computed on read).
    pub tasks_count: i64,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every update.
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}
