//! Workout Timer - A state-managed HTTP server for active workout timing
//!
//! This is the main entry point for the workout-timer application.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use workout_timer::{
    api::create_router,
    config::Config,
    services::{ElapsedStore, JsonFileStore, PlanTracker, WorkoutPlan},
    state::{AppState, WorkoutSession},
    tasks::autosave_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("workout_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting workout-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, state_file={}, rest_step={}s",
        config.host,
        config.port,
        config.state_file.display(),
        config.rest_step
    );

    let plan = match &config.plan {
        Some(path) => WorkoutPlan::from_file(path)?,
        None => WorkoutPlan::default_plan(),
    };
    let plan = Arc::new(PlanTracker::new(plan)?);

    let store = Arc::new(JsonFileStore::new(&config.state_file));
    if config.fresh {
        store.clear()?;
    }

    let session = WorkoutSession::start(plan.clone(), plan.clone(), store);

    // Periodically snapshot the stopwatch so a restart can resume it
    tokio::spawn(autosave_task(
        Arc::clone(&session),
        Duration::from_secs(config.autosave_secs.max(1)),
    ));

    let state = Arc::new(AppState::new(
        Arc::clone(&session),
        plan,
        config.rest_step,
        config.port,
        config.host.clone(),
    ));
    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /sets/:i/complete   - Complete a set, open rest prompt");
    info!("  POST /sets/:i/uncomplete - Undo a set");
    info!("  POST /rest/start         - Start the rest countdown");
    info!("  POST /rest/stop          - End rest, resume stopwatch");
    info!("  POST /rest/adjust        - Change next rest duration");
    info!("  POST /exercise/next      - Next exercise");
    info!("  POST /session/finish     - Finish the workout");
    info!("  GET  /status             - Session and plan status");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if !session.is_ended() {
        let elapsed = session.snapshot();
        info!("Session saved at {}s for next start", elapsed);
    }

    info!("Server shutdown complete");
    Ok(())
}
