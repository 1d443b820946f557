//! Task management REST API: users own tasks, stored in SQLite and served
//! as JSON over HTTP.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// The full application: routes, shared state and request tracing.
pub fn app(state: AppState) -> Router {
    routes::routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
