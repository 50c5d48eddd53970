//! Background tasks module
//!
//! Periodic tickers and the background tasks that run alongside a workout
//! session.

pub mod auto_advance;
pub mod autosave;
pub mod ticker;

// Re-export main types and functions
pub use auto_advance::auto_advance_task;
pub use autosave::autosave_task;
pub use ticker::Ticker;
