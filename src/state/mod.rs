//! State management module
//!
//! The timing core (stopwatch and rest cycle), the session orchestrator that
//! couples them, and the shared state the HTTP layer works on.

pub mod app_state;
pub mod rest_cycle;
pub mod session;
pub mod stopwatch;

// Re-export main types
pub use app_state::AppState;
pub use rest_cycle::{CompletedRest, RestCycle, RestPhase, RestSnapshot};
pub use session::{RestRecord, SessionEvent, SessionStatus, WorkoutSession};
pub use stopwatch::WorkoutStopwatch;
