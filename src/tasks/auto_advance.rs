//! Auto-advance background task

use std::sync::Weak;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info, warn};

use crate::state::{SessionEvent, WorkoutSession};

/// Moves the session to the next exercise once every set of the current one is
/// complete. Runs after the completing call has returned, so the set update and
/// the rest prompt are committed before navigation happens.
///
/// Holds the session weakly and stops when the session is gone.
pub async fn auto_advance_task(session: Weak<WorkoutSession>, mut events: Receiver<SessionEvent>) {
    info!("Starting auto-advance task");

    loop {
        match events.recv().await {
            Ok(SessionEvent::ExerciseCompleted { exercise_index }) => {
                let Some(session) = session.upgrade() else {
                    break;
                };
                session.auto_advance(exercise_index);
            }
            Ok(SessionEvent::Finished { .. }) | Ok(SessionEvent::Abandoned) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Auto-advance task lagged, skipped {} session events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    debug!("Auto-advance task stopped");
}
