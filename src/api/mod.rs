//! HTTP API module
//!
//! Endpoint handlers and response structures for driving a workout session.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stopwatch/toggle", post(toggle_stopwatch_handler))
        .route("/stopwatch/reset", post(reset_stopwatch_handler))
        .route("/sets/:set_index/complete", post(complete_set_handler))
        .route("/sets/:set_index/uncomplete", post(uncomplete_set_handler))
        .route("/rest/start", post(start_rest_handler))
        .route("/rest/stop", post(stop_rest_handler))
        .route("/rest/adjust", post(adjust_rest_handler))
        .route("/exercise/next", post(next_exercise_handler))
        .route("/exercise/previous", post(previous_exercise_handler))
        .route("/exercise/:index/select", post(select_exercise_handler))
        .route("/session/snapshot", post(snapshot_handler))
        .route("/session/finish", post(finish_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
