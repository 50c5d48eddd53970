//! Periodic session snapshot task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::WorkoutSession;

/// Background task that persists the session stopwatch every `period`, so a
/// killed or crashed process resumes close to where it stopped
pub async fn autosave_task(session: Arc<WorkoutSession>, period: Duration) {
    info!("Starting autosave task every {}s", period.as_secs());

    let mut interval = interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing worth saving yet.
    interval.tick().await;

    loop {
        interval.tick().await;

        if session.is_ended() {
            debug!("Session ended, stopping autosave");
            break;
        }

        let elapsed = session.snapshot();
        debug!("Autosaved session at {}s", elapsed);
    }
}
