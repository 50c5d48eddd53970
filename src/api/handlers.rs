//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{info, warn};

use super::responses::{
    ApiResponse, FinishResponse, HealthResponse, RestAdjustRequest, StatusResponse,
};
use crate::{
    error::{PlanError, SessionError},
    services::ExerciseNavigation,
    state::AppState,
    utils::format,
};

type ApiResult<T> = Result<Json<T>, StatusCode>;

fn session_error(action: &str, e: SessionError) -> StatusCode {
    warn!("Rejected {}: {}", action, e);
    StatusCode::CONFLICT
}

fn plan_error(action: &str, e: PlanError) -> StatusCode {
    warn!("Rejected {}: {}", action, e);
    match e {
        PlanError::SetOutOfRange { .. } | PlanError::ExerciseOutOfRange(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handle POST /stopwatch/toggle - Pause or resume the workout stopwatch
pub async fn toggle_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let running = state
        .session
        .toggle_stopwatch()
        .map_err(|e| session_error("stopwatch toggle", e))?;
    state.record_action("stopwatch-toggle");

    let message = if running { "Stopwatch resumed" } else { "Stopwatch paused" };
    Ok(Json(ApiResponse::ok(message.to_string(), state.session.status())))
}

/// Handle POST /stopwatch/reset - Zero the workout stopwatch
pub async fn reset_stopwatch_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    state
        .session
        .reset_stopwatch()
        .map_err(|e| session_error("stopwatch reset", e))?;
    state.record_action("stopwatch-reset");

    Ok(Json(ApiResponse::ok(
        "Stopwatch reset".to_string(),
        state.session.status(),
    )))
}

/// Handle POST /sets/:set_index/complete - Tick off a set and open the rest prompt
pub async fn complete_set_handler(
    State(state): State<Arc<AppState>>,
    Path(set_index): Path<usize>,
) -> ApiResult<ApiResponse> {
    if state.session.is_ended() {
        return Err(session_error("set completion", SessionError::Ended));
    }

    let exercise_complete = state
        .plan
        .complete_set(set_index)
        .map_err(|e| plan_error("set completion", e))?;
    state
        .session
        .on_set_completed(set_index, exercise_complete)
        .map_err(|e| session_error("set completion", e))?;
    state.record_action("set-complete");

    info!("Set {} completed via API", set_index);
    Ok(Json(ApiResponse::ok(
        format!("Set {} completed", set_index + 1),
        state.session.status(),
    )))
}

/// Handle POST /sets/:set_index/uncomplete - Undo a set and cancel its rest prompt
pub async fn uncomplete_set_handler(
    State(state): State<Arc<AppState>>,
    Path(set_index): Path<usize>,
) -> ApiResult<ApiResponse> {
    if state.session.is_ended() {
        return Err(session_error("set undo", SessionError::Ended));
    }

    state
        .plan
        .uncomplete_set(set_index)
        .map_err(|e| plan_error("set undo", e))?;
    state
        .session
        .on_set_uncompleted(set_index)
        .map_err(|e| session_error("set undo", e))?;
    state.record_action("set-uncomplete");

    Ok(Json(ApiResponse::ok(
        format!("Set {} marked incomplete", set_index + 1),
        state.session.status(),
    )))
}

/// Handle POST /rest/start - Start counting down the prepared rest
pub async fn start_rest_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let rest = state
        .session
        .on_rest_started()
        .map_err(|e| session_error("rest start", e))?;
    state.record_action("rest-start");

    Ok(Json(ApiResponse::ok(
        format!("Rest started: {}", format::minutes_seconds(rest.target_seconds)),
        state.session.status(),
    )))
}

/// Handle POST /rest/stop - End the rest and resume the stopwatch
pub async fn stop_rest_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let record = state
        .session
        .on_rest_ended()
        .map_err(|e| session_error("rest stop", e))?;
    state.record_action("rest-stop");

    let response = match record {
        Some(record) => ApiResponse::ok(
            format!("Rested {}", format::minutes_seconds(record.actual_seconds)),
            state.session.status(),
        ),
        None => ApiResponse::unchanged("No rest was running".to_string(), state.session.status()),
    };
    Ok(Json(response.with_rest_record(record)))
}

/// Handle POST /rest/adjust - Change the duration of the next rest
pub async fn adjust_rest_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RestAdjustRequest>,
) -> ApiResult<ApiResponse> {
    let delta = request
        .delta_seconds
        .or_else(|| {
            request
                .steps
                .map(|steps| {
                    let step = i64::try_from(state.rest_step_seconds).unwrap_or(i64::MAX);
                    steps.saturating_mul(step)
                })
        })
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    let next = state
        .session
        .adjust_rest(delta)
        .map_err(|e| session_error("rest adjust", e))?;
    state.record_action("rest-adjust");

    Ok(Json(ApiResponse::ok(
        format!("Next rest: {}", format::minutes_seconds(next)),
        state.session.status(),
    )))
}

async fn navigate(state: Arc<AppState>, navigation: ExerciseNavigation) -> ApiResult<ApiResponse> {
    let next_rest = state
        .session
        .on_exercise_navigated(navigation)
        .map_err(|e| session_error("exercise navigation", e))?;
    state.record_action("exercise-navigate");

    let plan = state.plan.status();
    let response = match next_rest {
        Some(_) => ApiResponse::ok(
            format!("Now on {}", plan.current_exercise_name),
            state.session.status(),
        ),
        None => ApiResponse::unchanged(
            format!("Still on {}", plan.current_exercise_name),
            state.session.status(),
        ),
    };
    Ok(Json(response))
}

/// Handle POST /exercise/next
pub async fn next_exercise_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    navigate(state, ExerciseNavigation::Next).await
}

/// Handle POST /exercise/previous
pub async fn previous_exercise_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse> {
    navigate(state, ExerciseNavigation::Previous).await
}

/// Handle POST /exercise/:index/select
pub async fn select_exercise_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> ApiResult<ApiResponse> {
    if index >= state.plan.plan().exercises.len() {
        return Err(plan_error("exercise select", PlanError::ExerciseOutOfRange(index)));
    }
    navigate(state, ExerciseNavigation::Select(index)).await
}

/// Handle POST /session/snapshot - Persist the elapsed time now
pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse> {
    let elapsed = state.session.snapshot();
    state.record_action("snapshot");

    Ok(Json(ApiResponse::ok(
        format!("Saved session at {}", format::clock(elapsed)),
        state.session.status(),
    )))
}

/// Handle POST /session/finish - End the workout and report its duration
pub async fn finish_handler(State(state): State<Arc<AppState>>) -> ApiResult<FinishResponse> {
    let elapsed = state
        .session
        .finish()
        .map_err(|e| session_error("finish", e))?;
    state.record_action("finish");

    Ok(Json(FinishResponse {
        elapsed_seconds: elapsed,
        duration: format::hours_minutes(elapsed),
        plan: state.plan.status(),
        timestamp: Utc::now(),
    }))
}

/// Handle GET /status - Return session, plan and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        session: state.session.status(),
        plan: state.plan.status(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
