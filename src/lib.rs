//! Workout Timer - A state-managed HTTP server for active workout timing
//!
//! The core is a session stopwatch and a rest-between-sets cycle, coordinated
//! by [`WorkoutSession`] so that resting pauses the workout clock and ending
//! the rest resumes it and logs the rest actually taken.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{PlanError, SessionError, StoreError};
pub use state::{AppState, RestCycle, WorkoutSession, WorkoutStopwatch};
pub use utils::signals::shutdown_signal;
