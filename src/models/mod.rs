//! Core data models for the task management service.
//!
//! Rows map to database tables via `sqlx::FromRow` and serialize as the JSON
//! shapes returned by the API.

pub mod task;
pub mod user;
